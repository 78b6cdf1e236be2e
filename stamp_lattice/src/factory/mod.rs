//! Construction of commonly used stamps.
//!
//! [`StampFactory`] validates arguments, canonicalizes results and memoizes
//! the stamps that are requested over and over (unrestricted stamps per
//! kind, constants, exact object stamps) in an injected [`StampCache`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use stamp_lattice::config::LatticeConfig;
//! use stamp_lattice::constant::Constant;
//! use stamp_lattice::factory::{StampCache, StampFactory};
//!
//! let cache = Arc::new(StampCache::new());
//! let factory = StampFactory::new(Arc::clone(&cache), LatticeConfig::default());
//!
//! let five = factory.for_constant(&Constant::int(5));
//! assert_eq!(five.as_constant(), Some(Constant::int(5)));
//! assert_eq!(factory.for_integer(32, 5, 5).unwrap(), five);
//! ```

mod cache;

pub use cache::{CacheStats, StampCache};

use crate::bits::{self, max_unsigned, max_value, min_value};
use crate::config::LatticeConfig;
use crate::constant::Constant;
use crate::error::{Result, StampError};
use crate::kind::MachineKind;
use crate::meta::TypeRef;
use crate::stamp::{
    FloatStamp, GenericCategory, GenericStamp, IntegerStamp, ObjectStamp, Stamp, WordStamp,
};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct StampFactory {
    cache: Arc<StampCache>,
    config: LatticeConfig,
}

impl StampFactory {
    pub fn new(cache: Arc<StampCache>, config: LatticeConfig) -> Self {
        Self { cache, config }
    }

    pub fn cache(&self) -> &Arc<StampCache> {
        &self.cache
    }

    pub fn config(&self) -> &LatticeConfig {
        &self.config
    }

    /// Unrestricted stamp of `kind`. Words use the configured width.
    pub fn for_kind(&self, kind: MachineKind) -> Stamp {
        match kind {
            MachineKind::Word => self.for_word(false),
            _ => self.cache.unrestricted(kind),
        }
    }

    pub fn for_void(&self) -> Stamp {
        self.cache.unrestricted(MachineKind::Void)
    }

    /// The general bottom element.
    pub fn illegal(&self) -> Stamp {
        Stamp::illegal()
    }

    /// Bottom element of `kind`.
    pub fn illegal_for(&self, kind: MachineKind) -> Stamp {
        Stamp::Illegal(kind)
    }

    /// Signed range `[lower, upper]`. An empty range (`lower > upper`) is
    /// the Illegal stamp of the kind.
    pub fn for_integer(&self, bits: u32, lower: i64, upper: i64) -> Result<Stamp> {
        check_integer_bits(bits)?;
        for value in [lower, upper] {
            check_in_range(bits, value)?;
        }
        Ok(IntegerStamp::for_range(bits, lower, upper))
    }

    /// Fully specified integer stamp; see [`IntegerStamp::new`].
    pub fn for_integer_with_mask(
        &self,
        bits: u32,
        lower: i64,
        upper: i64,
        down: u64,
        up: u64,
    ) -> Result<Stamp> {
        IntegerStamp::new(bits, lower, upper, down, up).map(Stamp::Integer)
    }

    /// Values whose unsigned reading lies in `[lower, upper]`.
    pub fn for_unsigned_integer(&self, bits: u32, lower: u64, upper: u64) -> Result<Stamp> {
        check_integer_bits(bits)?;
        for value in [lower, upper] {
            if value > max_unsigned(bits) {
                return Err(StampError::MaskOutOfRange { bits, mask: value });
            }
        }
        if lower > upper {
            return Ok(Stamp::empty_integer(bits));
        }
        let signed_max = max_value(bits) as u64;
        let lo = bits::sign_extend(lower as i64, bits);
        let hi = bits::sign_extend(upper as i64, bits);
        if upper <= signed_max || lower > signed_max {
            return Ok(IntegerStamp::for_range(bits, lo, hi));
        }
        // crosses the sign boundary: [lower, MAX] and [MIN, hi]
        let high = IntegerStamp::for_range(bits, lo, max_value(bits));
        let low = IntegerStamp::for_range(bits, min_value(bits), hi);
        Ok(high.meet(&low))
    }

    /// 32-bit `[0, i32::MAX]`.
    pub fn positive_int(&self) -> Stamp {
        IntegerStamp::for_range(32, 0, max_value(32))
    }

    pub fn for_float(&self, kind: MachineKind, lower: f64, upper: f64, non_nan: bool) -> Result<Stamp> {
        let bits = kind
            .bits()
            .filter(|_| kind.is_numeric_float())
            .ok_or(StampError::NotAFloatKind(kind))?;
        FloatStamp::new(bits, lower, upper, non_nan).map(Stamp::Float)
    }

    /// Stamp containing exactly `constant`, memoized.
    pub fn for_constant(&self, constant: &Constant) -> Stamp {
        self.cache
            .constant(constant, || Stamp::for_constant(constant))
    }

    /// Any reference, possibly null.
    pub fn object(&self) -> Stamp {
        self.cache.unrestricted(MachineKind::Object)
    }

    pub fn object_non_null(&self) -> Stamp {
        Stamp::Object(self.object_stamp(None, false, true))
    }

    pub fn always_null(&self) -> Stamp {
        Stamp::Object(ObjectStamp::always_null())
    }

    /// References assignable to `ty`.
    pub fn declared(&self, ty: &TypeRef) -> Stamp {
        self.memoized_object(ty, false, false)
    }

    pub fn declared_non_null(&self, ty: &TypeRef) -> Stamp {
        self.memoized_object(ty, false, true)
    }

    /// References whose class is exactly `ty`. `ty` must be concrete.
    pub fn exact(&self, ty: &TypeRef) -> Result<Stamp> {
        ObjectStamp::exact(ty, false)?;
        Ok(self.memoized_object(ty, true, false))
    }

    pub fn exact_non_null(&self, ty: &TypeRef) -> Result<Stamp> {
        ObjectStamp::exact(ty, true)?;
        Ok(self.memoized_object(ty, true, true))
    }

    fn memoized_object(&self, ty: &TypeRef, exact: bool, non_null: bool) -> Stamp {
        self.cache.object(&(Arc::clone(ty), exact, non_null), || {
            Stamp::Object(self.object_stamp(Some(Arc::clone(ty)), exact, non_null))
        })
    }

    fn object_stamp(&self, ty: Option<TypeRef>, exact: bool, non_null: bool) -> ObjectStamp {
        match (&ty, exact) {
            (Some(t), true) => {
                ObjectStamp::exact(t, non_null).unwrap_or_else(|_| ObjectStamp::declared(t, non_null))
            }
            (Some(t), false) => ObjectStamp::declared(t, non_null),
            (None, _) => ObjectStamp::new(None, false, non_null, false)
                .unwrap_or_else(|_| ObjectStamp::unrestricted()),
        }
    }

    /// Machine word of the configured width.
    pub fn for_word(&self, non_null: bool) -> Stamp {
        Stamp::Word(WordStamp::new(self.config.word_bits, non_null))
    }

    pub fn for_generic(&self, category: GenericCategory) -> Stamp {
        Stamp::Generic(GenericStamp::new(category))
    }
}

fn check_integer_bits(bits: u32) -> Result<()> {
    if bits::is_valid_integer_bits(bits) {
        Ok(())
    } else {
        Err(StampError::InvalidBitWidth(bits))
    }
}

fn check_in_range(bits: u32, value: i64) -> Result<()> {
    if value < min_value(bits) || value > max_value(bits) {
        return Err(StampError::BoundsOutOfRange {
            bits,
            value,
            min: min_value(bits),
            max: max_value(bits),
        });
    }
    Ok(())
}

// cv-core/src/units.rs

use uom::si::f64::{Area as UomArea, Length as UomLength, Volume as UomVolume};

// Public canonical unit types (SI, f64)
pub type Area = UomArea;
pub type Length = UomLength;
pub type Volume = UomVolume;

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn m2(v: f64) -> Area {
    use uom::si::area::square_meter;
    Area::new::<square_meter>(v)
}

#[inline]
pub fn m3(v: f64) -> Volume {
    use uom::si::volume::cubic_meter;
    Volume::new::<cubic_meter>(v)
}

/// Initial values given to geometry variables when they are created.
pub mod defaults {
    use super::*;

    #[inline]
    pub fn length() -> Length {
        m(1.0)
    }

    #[inline]
    pub fn area() -> Area {
        m2(1.0)
    }

    #[inline]
    pub fn volume() -> Volume {
        m3(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_unit_si() {
        assert_eq!(defaults::length().value, 1.0);
        assert_eq!(defaults::area().value, 1.0);
        assert_eq!(defaults::volume().value, 1.0);
    }

    #[test]
    fn area_is_length_squared() {
        let a: Area = m(2.0) * m(3.0);
        assert!((a.value - m2(6.0).value).abs() < 1e-12);
    }
}

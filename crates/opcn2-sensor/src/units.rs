//! Physical units of the decoded histogram fields
//!
//! Only used for presentation.

/// Field name to unit
pub const UNITS: &[(&str, &str)] = &[
    ("bins", "particle / second"),
    ("mtof", "second"),
    ("sample flow rate", "sample / second"),
    ("sampling period", "second"),
    ("pm1", "microgram / meter^3"),
    ("pm2.5", "microgram / meter^3"),
    ("pm10", "microgram / meter^3"),
    ("temperature", "celsius"),
    ("pressure", "pascal"),
];

/// Look up the unit of a field
pub fn unit_of(name: &str) -> Option<&'static str> {
    UNITS
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(_, unit)| *unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_of() {
        assert_eq!(unit_of("pm2.5"), Some("microgram / meter^3"));
        assert_eq!(unit_of("pressure"), Some("pascal"));
        assert_eq!(unit_of("checksum"), None);
    }
}

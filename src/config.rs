use std::env;
use std::str::FromStr;

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Returns the value of the named environment variable, if set and not
/// blank.
pub fn get_optional_variable(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses the named environment variable, falling back to `default`
/// when it isn’t set. Panics if it is set but can’t be parsed.
pub fn parse_variable_or<T: FromStr>(name: &str, default: T) -> T {
    match get_optional_variable(name) {
        Some(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("parse {} ({:?})", name, value)),
        None => default,
    }
}

/// Which store to keep entries in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Storage {
    Postgres,
    /// Process memory. For local runs only.
    Memory,
}

impl FromStr for Storage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Storage::Postgres),
            "memory" => Ok(Storage::Memory),
            other => Err(format!("unknown storage {:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_names_are_case_insensitive() {
        assert_eq!("Postgres".parse(), Ok(Storage::Postgres));
        assert_eq!(" memory ".parse(), Ok(Storage::Memory));
        assert!("sqlite".parse::<Storage>().is_err());
    }

    #[test]
    fn unset_variables_fall_back() {
        assert_eq!(
            parse_variable_or("MOOD_JOURNAL_TEST_SURELY_UNSET", 42u16),
            42
        );
    }
}

use crate::errors::{Result, Rule1Error};

/// A Tokyo Stock Exchange listing, e.g. code `7203` → symbol `7203.T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticker {
    pub code: String,
    pub symbol: String,
}

impl Ticker {
    /// Normalises a user-entered securities code.
    ///
    /// Accepts `7203`, ` 7203 `, `130a` and already-suffixed `7203.T`.
    pub fn parse(input: &str, exchange_suffix: &str) -> Result<Self> {
        let trimmed = input.trim().to_uppercase();
        let suffix = exchange_suffix.to_uppercase();
        let code = trimmed.strip_suffix(&suffix).unwrap_or(trimmed.as_str());

        if code.is_empty() {
            return Err(Rule1Error::ConfigError("securities code is empty".to_string()));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Rule1Error::ConfigError(format!(
                "invalid securities code: {}",
                input.trim()
            )));
        }

        Ok(Self {
            code: code.to_string(),
            symbol: format!("{}{}", code, exchange_suffix),
        })
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_code_gets_suffix() {
        let t = Ticker::parse("7203", ".T").unwrap();
        assert_eq!(t.code, "7203");
        assert_eq!(t.symbol, "7203.T");
    }

    #[test]
    fn suffixed_and_padded_input_is_normalised() {
        assert_eq!(Ticker::parse(" 7203.t ", ".T").unwrap().symbol, "7203.T");
        assert_eq!(Ticker::parse("130a", ".T").unwrap().symbol, "130A.T");
    }

    #[test]
    fn empty_or_garbage_is_rejected() {
        assert!(Ticker::parse("   ", ".T").is_err());
        assert!(Ticker::parse(".T", ".T").is_err());
        assert!(Ticker::parse("72/03", ".T").is_err());
    }
}

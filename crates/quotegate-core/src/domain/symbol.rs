use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Longest ticker forwarded to the provider.
pub const MAX_SYMBOL_LEN: usize = 20;

/// Upper-cased ticker, used for provider calls and as half of the cache key.
///
/// Besides plain equities this admits index (`^GSPC`), currency (`EURUSD=X`)
/// and share-class (`BRK-B`, `BRK.B`) tickers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

const fn is_ticker_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '-' | '^' | '=' | '_')
}

impl Symbol {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let ticker = input.trim().to_ascii_uppercase();

        match ticker.chars().count() {
            0 => return Err(ValidationError::EmptySymbol),
            len if len > MAX_SYMBOL_LEN => {
                return Err(ValidationError::SymbolTooLong {
                    len,
                    max: MAX_SYMBOL_LEN,
                })
            }
            _ => {}
        }

        if let Some((index, ch)) = ticker.chars().enumerate().find(|(_, ch)| !is_ticker_char(*ch)) {
            return Err(ValidationError::SymbolInvalidChar { ch, index });
        }

        Ok(Self(ticker))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Symbol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

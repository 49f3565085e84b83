//! Checkout configuration
//!
//! Describes the single line item offered on the hosted checkout page and
//! where the payer lands afterwards. `success_url` and `cancel_url` default
//! to `{base_url}?success=true` and `{base_url}?canceled=true`.

use serde::Deserialize;

use super::error::ValidationError;

/// Checkout session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutConfig {
    /// Public site URL the payer returns to
    pub base_url: String,

    /// Explicit success URL; may contain `{CHECKOUT_SESSION_ID}`
    pub success_url: Option<String>,

    /// Explicit cancel URL
    pub cancel_url: Option<String>,

    /// ISO currency code, lowercase
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Product name shown on the hosted page
    #[serde(default = "default_product_name")]
    pub product_name: String,

    /// Optional product description
    pub product_description: Option<String>,

    /// Smallest accepted donation in major units
    #[serde(default = "default_min_amount")]
    pub min_amount: u32,

    /// Largest accepted donation in major units
    #[serde(default = "default_max_amount")]
    pub max_amount: u32,
}

impl CheckoutConfig {
    pub fn success_url(&self) -> String {
        self.success_url
            .clone()
            .unwrap_or_else(|| format!("{}?success=true", self.base_url))
    }

    pub fn cancel_url(&self) -> String {
        self.cancel_url
            .clone()
            .unwrap_or_else(|| format!("{}?canceled=true", self.base_url))
    }

    /// Validate checkout configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("CHECKOUT_BASE_URL"));
        }
        let is_http = |url: &str| url.starts_with("https://") || url.starts_with("http://");
        if !is_http(&self.base_url) {
            return Err(ValidationError::InvalidCheckoutBaseUrl);
        }
        for url in [&self.success_url, &self.cancel_url].into_iter().flatten() {
            if !is_http(url) {
                return Err(ValidationError::InvalidCheckoutBaseUrl);
            }
        }
        if self.min_amount == 0 || self.min_amount > self.max_amount {
            return Err(ValidationError::InvalidAmountBounds {
                min: self.min_amount,
                max: self.max_amount,
            });
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(ValidationError::InvalidCurrency);
        }
        Ok(())
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            success_url: None,
            cancel_url: None,
            currency: default_currency(),
            product_name: default_product_name(),
            product_description: None,
            min_amount: default_min_amount(),
            max_amount: default_max_amount(),
        }
    }
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_product_name() -> String {
    "Buy Me a Coffee".to_string()
}

fn default_min_amount() -> u32 {
    1
}

fn default_max_amount() -> u32 {
    999
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CheckoutConfig {
        CheckoutConfig {
            base_url: "https://everycity.example/support".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn redirect_urls_derive_from_base() {
        let config = valid();
        assert_eq!(
            config.success_url(),
            "https://everycity.example/support?success=true"
        );
        assert_eq!(
            config.cancel_url(),
            "https://everycity.example/support?canceled=true"
        );
    }

    #[test]
    fn explicit_redirect_urls_win() {
        let config = CheckoutConfig {
            success_url: Some(
                "https://everycity.example/thanks?session_id={CHECKOUT_SESSION_ID}".to_string(),
            ),
            cancel_url: Some("https://everycity.example/cancelled".to_string()),
            ..valid()
        };
        assert!(config.success_url().ends_with("{CHECKOUT_SESSION_ID}"));
        assert_eq!(config.cancel_url(), "https://everycity.example/cancelled");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn defaults_match_public_widget() {
        let config = CheckoutConfig::default();
        assert_eq!(config.currency, "usd");
        assert_eq!(config.min_amount, 1);
        assert_eq!(config.max_amount, 999);
    }

    #[test]
    fn validation_requires_base_url() {
        assert_eq!(
            CheckoutConfig::default().validate(),
            Err(ValidationError::MissingRequired("CHECKOUT_BASE_URL"))
        );
    }

    #[test]
    fn validation_rejects_relative_urls() {
        let config = CheckoutConfig {
            cancel_url: Some("/cancelled".to_string()),
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCheckoutBaseUrl));
    }

    #[test]
    fn validation_rejects_inverted_bounds() {
        let config = CheckoutConfig {
            min_amount: 50,
            max_amount: 10,
            ..valid()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidAmountBounds { min: 50, max: 10 })
        ));
    }

    #[test]
    fn validation_rejects_uppercase_currency() {
        let config = CheckoutConfig {
            currency: "USD".to_string(),
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidCurrency));
    }
}

//! Donor thank-you notifications.
//!
//! Exactly two fixed messages exist: one for a first donation and one for a
//! repeat donor, which mentions how many coffees they have bought so far.

use rust_decimal::Decimal;
use std::fmt;

/// Which thank-you message a donor receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThankYouTemplate {
    FirstTime,
    /// `donation_count` includes the donation being thanked.
    Repeat { donation_count: i64 },
}

impl ThankYouTemplate {
    /// Picks the template from the number of donations recorded for the email
    /// before this one.
    pub fn for_prior_count(prior_count: i64) -> Self {
        if prior_count <= 0 {
            ThankYouTemplate::FirstTime
        } else {
            ThankYouTemplate::Repeat {
                donation_count: prior_count + 1,
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ThankYouTemplate::FirstTime => "first_time",
            ThankYouTemplate::Repeat { .. } => "repeat",
        }
    }
}

impl fmt::Display for ThankYouTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rendered thank-you message addressed to one donor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThankYouEmail {
    pub to: String,
    pub first_name: String,
    /// Major units
    pub amount: Decimal,
    pub template: ThankYouTemplate,
}

impl ThankYouEmail {
    pub fn new(
        to: impl Into<String>,
        first_name: impl Into<String>,
        amount: Decimal,
        template: ThankYouTemplate,
    ) -> Self {
        Self {
            to: to.into(),
            first_name: first_name.into(),
            amount,
            template,
        }
    }

    pub fn subject(&self) -> String {
        match self.template {
            ThankYouTemplate::FirstTime => {
                format!("Thanks for the coffee, {}!", self.first_name)
            }
            ThankYouTemplate::Repeat { donation_count } => format!(
                "Coffee number {} - thank you again, {}!",
                donation_count, self.first_name
            ),
        }
    }

    pub fn text_body(&self) -> String {
        let amount = format!("{:.2}", self.amount);
        match self.template {
            ThankYouTemplate::FirstTime => format!(
                "Hi {name},\n\n\
                 Thank you for your ${amount} coffee! Your support keeps the show going.\n\n\
                 Cheers,\nThe EveryCity Whispers team",
                name = self.first_name,
            ),
            ThankYouTemplate::Repeat { donation_count } => format!(
                "Hi {name},\n\n\
                 You came back! That's {count} coffees now, and this ${amount} one is just as appreciated as the first.\n\n\
                 Cheers,\nThe EveryCity Whispers team",
                name = self.first_name,
                count = donation_count,
            ),
        }
    }

    /// HTML version of [`Self::text_body`] with the donor name escaped.
    pub fn html_body(&self) -> String {
        let escaped = ThankYouEmail {
            first_name: html_escape::encode_text(&self.first_name).into_owned(),
            ..self.clone()
        };
        let paragraphs: Vec<String> = escaped
            .text_body()
            .split("\n\n")
            .map(|p| format!("<p>{}</p>", p.replace('\n', "<br>")))
            .collect();
        paragraphs.join("\n")
    }
}

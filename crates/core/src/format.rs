use crate::types::{CanonicalEvent, MonetaryValue};

/// Format a monetary amount with two decimals
pub fn format_amount(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// One-line human summary of a canonical event
pub fn format_event_summary(event: &CanonicalEvent) -> String {
    let mut output = format!("{} <- {}", event.event_type, event.event_name);

    if let Some(value) = &event.commerce.value {
        let amount = match value {
            MonetaryValue::Amount(amount) => format_amount(*amount),
            MonetaryValue::Text(text) => text.clone(),
        };
        let currency = event.commerce.currency.as_deref().unwrap_or_default();
        output.push_str(&format!(" | {} {}", amount, currency));
    }

    if let Some(items) = &event.commerce.items {
        output.push_str(&format!(" | {} item(s)", items.len()));
    }

    if let Some(term) = &event.commerce.search_term {
        output.push_str(&format!(" | \"{}\"", term));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_have_two_decimals() {
        assert_eq!(format_amount(25.0), "25.00");
        assert_eq!(format_amount(42.5), "42.50");
        assert_eq!(format_amount(0.0), "0.00");
    }
}

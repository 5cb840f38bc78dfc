use colored::{ColoredString, Colorize};

use crate::models::DisplayStatus;

/// Format a float as a currency amount with thousands separators: R$1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let cents = format!("{:.2}", abs);
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-R${with_commas}.{dec_part}")
    } else {
        format!("R${with_commas}.{dec_part}")
    }
}

pub fn optional_money(val: Option<f64>) -> String {
    val.map(money).unwrap_or_default()
}

pub fn status_label(status: DisplayStatus) -> ColoredString {
    match status {
        DisplayStatus::Overdue => status.label().red().bold(),
        DisplayStatus::Completed => status.label().green(),
        DisplayStatus::InProgress => status.label().yellow(),
        DisplayStatus::Pending => status.label().normal(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "R$1,234.56");
        assert_eq!(money(-500.00), "-R$500.00");
        assert_eq!(money(0.0), "R$0.00");
        assert_eq!(money(1000000.99), "R$1,000,000.99");
        assert_eq!(money(42.10), "R$42.10");
    }

    #[test]
    fn test_optional_money() {
        assert_eq!(optional_money(None), "");
        assert_eq!(optional_money(Some(10.0)), "R$10.00");
    }
}

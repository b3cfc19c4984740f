use chrono::{DateTime, NaiveDate};
use minijinja::Value;

/// Formats a date string; accepts ISO dates and RFC 3339 timestamps.
pub fn format_date(value: Value, format: Option<Value>) -> Result<Value, minijinja::Error> {
    let format_str = format
        .and_then(|f| f.as_str().map(|s| s.to_string()))
        .unwrap_or_else(|| "%d/%m/%Y".to_string());

    if let Some(date_str) = value.as_str() {
        Ok(Value::from(format_date_string(date_str, &format_str)))
    } else {
        Ok(Value::from(""))
    }
}

/// Formats a number with thousands separators.
pub fn format_number(value: Value, decimals: Option<Value>) -> Result<Value, minijinja::Error> {
    let num = f64::try_from(value).map_err(|_| {
        minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, "Value must be a number")
    })?;

    let decimals = decimals.and_then(|d| u64::try_from(d).ok()).unwrap_or(2) as usize;
    Ok(Value::from(format_number_with_separators(num, decimals)))
}

pub fn money_filter(value: Value) -> Result<Value, minijinja::Error> {
    let amount = f64::try_from(value).map_err(|_| {
        minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, "Value must be a number")
    })?;

    let formatted = format_number_with_separators(amount.abs(), 2);
    if amount < 0.0 {
        Ok(Value::from(format!("-${}", formatted)))
    } else {
        Ok(Value::from(format!("${}", formatted)))
    }
}

pub fn date_filter(value: Value) -> Result<Value, minijinja::Error> {
    format_date(value, None)
}

pub fn format_number_with_separators(num: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, num);
    let (integer, fraction) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let digits: Vec<char> = integer.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    match fraction {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    }
}

pub fn format_date_string(date_str: &str, format: &str) -> String {
    if let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        return date.format(format).to_string();
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(date_str) {
        return datetime.format(format).to_string();
    }

    // Unparseable input passes through untouched.
    date_str.to_string()
}

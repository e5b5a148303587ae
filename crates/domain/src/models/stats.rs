//! Statistics formulas shared by the dashboards and analytics views.
//!
//! All rates are percentages rounded to one decimal place. A zero (or
//! negative) denominator yields exactly `0.0` instead of NaN or infinity.

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / total` as a percentage in `[0, 100]`.
///
/// Used for approval rate (approved / total) and completion rate
/// (completed / total).
pub fn percentage(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let part = part.clamp(0, total);
    round1(part as f64 / total as f64 * 100.0)
}

/// Growth of a population: `new / (total - new)` as a percentage.
///
/// Not clamped: a population that more than doubled grows by over 100%.
pub fn growth_rate(new_count: i64, total: i64) -> f64 {
    let previous = total - new_count;
    if previous <= 0 || new_count <= 0 {
        return 0.0;
    }
    round1(new_count as f64 / previous as f64 * 100.0)
}

/// Progress-bar width of `count` relative to the largest value, clamped to 100.
pub fn percent_of_max(count: i64, max: i64) -> f64 {
    if max <= 0 {
        return 0.0;
    }
    round1((count as f64 / max as f64 * 100.0).clamp(0.0, 100.0))
}

/// Turns a stored identifier such as `super_admin` or `user_created` into a
/// display label (`Super Admin`, `User Created`).
pub fn humanize_label(value: &str) -> String {
    value
        .split(|c: char| c == '_' || c == '-' || c == '.')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn test_percentage_rounds_to_one_decimal() {
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(1, 8), 12.5);
    }

    #[test]
    fn test_percentage_bounds() {
        assert_eq!(percentage(10, 10), 100.0);
        assert_eq!(percentage(11, 10), 100.0);
        assert_eq!(percentage(-1, 10), 0.0);
        for total in 1..50 {
            for part in 0..=total {
                let rate = percentage(part, total);
                assert!((0.0..=100.0).contains(&rate));
            }
        }
    }

    #[test]
    fn test_growth_rate() {
        assert_eq!(growth_rate(0, 0), 0.0);
        assert_eq!(growth_rate(5, 5), 0.0);
        assert_eq!(growth_rate(2, 10), 25.0);
        assert_eq!(growth_rate(10, 15), 200.0);
        assert_eq!(growth_rate(1, 4), 33.3);
    }

    #[test]
    fn test_percent_of_max() {
        assert_eq!(percent_of_max(10, 10), 100.0);
        assert_eq!(percent_of_max(5, 10), 50.0);
        assert_eq!(percent_of_max(1, 3), 33.3);
        assert_eq!(percent_of_max(12, 10), 100.0);
        assert_eq!(percent_of_max(3, 0), 0.0);
    }

    #[test]
    fn test_humanize_label() {
        assert_eq!(humanize_label("super_admin"), "Super Admin");
        assert_eq!(humanize_label("user_created"), "User Created");
        assert_eq!(humanize_label("in-progress"), "In Progress");
        assert_eq!(humanize_label("pending"), "Pending");
        assert_eq!(humanize_label(""), "");
    }
}

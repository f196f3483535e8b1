pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            &$query[..$crate::floor_char_boundary(&$query, 497)].trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}

/// Largest char boundary not greater than `index`.
pub fn floor_char_boundary(value: &str, index: usize) -> usize {
    if index >= value.len() {
        return value.len();
    }
    (0..=index)
        .rev()
        .find(|i| value.is_char_boundary(*i))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separated() {
        let mut out = String::from("(");
        separated_by(&mut out, [1, 2, 3], |out, v| out.push_str(&v.to_string()), ", ");
        assert_eq!(out, "(1, 2, 3");
    }

    #[test]
    fn truncate() {
        let short = "SELECT 1 ;";
        assert_eq!(format!("{}", truncate_long!(short)), short);
        let long = "é".repeat(400);
        let truncated = format!("{}", truncate_long!(long));
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 500);
    }
}

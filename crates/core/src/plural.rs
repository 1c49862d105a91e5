//! Russian noun agreement for counts.

/// Pick the form agreeing with `n`: `one` for 1, 21, 101; `few` for 2-4,
/// 22-24; `many` for everything else including 11-14.
#[must_use]
pub fn plural_ru<'a>(n: i64, one: &'a str, few: &'a str, many: &'a str) -> &'a str {
    let n = n.unsigned_abs() % 100;
    if (5..=20).contains(&n) {
        return many;
    }
    match n % 10 {
        1 => one,
        2..=4 => few,
        _ => many,
    }
}

/// `"3 товара"`-style label for an item count.
#[must_use]
pub fn items_label(count: i64) -> String {
    format!("{count} {}", plural_ru(count, "товар", "товара", "товаров"))
}

/// Average of `sum / count` rounded up, `0` when nothing has been rated.
pub fn ceil_average(sum: i64, count: i64) -> i32 {
    if count <= 0 {
        return 0;
    }
    let rounded = (sum + count - 1).div_euclid(count);
    i32::try_from(rounded).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_orders_rate_zero() {
        assert_eq!(ceil_average(0, 0), 0);
    }

    #[test]
    fn exact_average_is_kept() {
        assert_eq!(ceil_average(12, 3), 4);
    }

    #[test]
    fn fractional_average_rounds_up() {
        // (5 + 4 + 4) / 3 = 4.33
        assert_eq!(ceil_average(13, 3), 5);
        // (1 + 2) / 2 = 1.5
        assert_eq!(ceil_average(3, 2), 2);
    }

    #[test]
    fn single_order_is_its_own_rating() {
        assert_eq!(ceil_average(1, 1), 1);
    }
}

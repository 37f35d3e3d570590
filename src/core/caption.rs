use crate::domain::model::DigitResult;

/// Caption for the post at `index`.
pub fn caption_for(index: i64, digit: DigitResult) -> String {
    match index {
        -1 => "Hello World!".to_string(),
        0 => "The only dot in this number.".to_string(),
        _ => format!("The digit at index {} is {}.", index, digit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_captions() {
        assert_eq!(caption_for(-1, DigitResult::Digit('3')), "Hello World!");
        assert_eq!(
            caption_for(0, DigitResult::Separator),
            "The only dot in this number."
        );
    }

    #[test]
    fn test_digit_caption() {
        assert_eq!(
            caption_for(5, DigitResult::Digit('9')),
            "The digit at index 5 is 9."
        );
    }
}

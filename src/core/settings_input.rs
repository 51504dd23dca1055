use std::num::{IntErrorKind, ParseIntError};
use thiserror::Error;
use crate::core::session::Mode;
use crate::models::{Sex, MAX_AGE, MIN_AGE};

/// Cities a profile may be set to, lower-cased
pub const CITIES: [&str; 22] = [
    "москва",
    "санкт-петербург",
    "новосибирск",
    "пермь",
    "казань",
    "нижний новгород",
    "челябинск",
    "самара",
    "омск",
    "ростов-на-дону",
    "уфа",
    "красноярск",
    "воронеж",
    "волгоград",
    "краснодар",
    "саратов",
    "тюмень",
    "тольятти",
    "ижевск",
    "елабуга",
    "набережные челны",
    "екатеринбург",
];

const FEMALE_TOKENS: [&str; 4] = ["1", "1 - женский", "женский", "ж"];
const MALE_TOKENS: [&str; 4] = ["2", "2 - мужской", "мужской", "м"];

/// Rejected settings input; the message is what the user is told
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("❌ Неверный формат. Отправьте 1 или 2")]
    UnknownSex,

    #[error("❌ Отправьте число. Например: 25")]
    NotANumber,

    #[error("❌ Возраст должен быть от 18 до 80 лет")]
    AgeOutOfRange(i64),

    #[error("❌ Город '{0}' не найден в списке. Выберите из доступных или напишите точное название.")]
    UnknownCity(String),
}

/// A validated profile field ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Sex(Sex),
    Age(u8),
    City(String),
}

impl SettingValue {
    /// Confirmation sent once the value is stored
    pub fn confirmation(&self) -> String {
        match self {
            SettingValue::Sex(sex) => format!("✅ Пол изменён на: {}", sex.label()),
            SettingValue::Age(age) => format!("✅ Возраст изменён на: {} лет", age),
            SettingValue::City(city) => format!("✅ Город изменён на: {}", title_case(city)),
        }
    }
}

/// Outcome of offering a message to the validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// The session is not waiting for a value
    NotWaiting,
    Accepted(SettingValue),
    Rejected(InputError),
}

/// Interpret raw text as the value the session is waiting for
pub fn validate(mode: Mode, raw: &str) -> Validation {
    let result = match mode {
        Mode::WaitingSex => parse_sex(raw).map(SettingValue::Sex),
        Mode::WaitingAge => parse_age(raw).map(SettingValue::Age),
        Mode::WaitingCity => parse_city(raw).map(SettingValue::City),
        Mode::Idle | Mode::Browsing => return Validation::NotWaiting,
    };

    match result {
        Ok(value) => Validation::Accepted(value),
        Err(e) => Validation::Rejected(e),
    }
}

pub fn parse_sex(raw: &str) -> Result<Sex, InputError> {
    let text = raw.trim().to_lowercase();
    if FEMALE_TOKENS.contains(&text.as_str()) {
        Ok(Sex::Female)
    } else if MALE_TOKENS.contains(&text.as_str()) {
        Ok(Sex::Male)
    } else {
        Err(InputError::UnknownSex)
    }
}

pub fn parse_age(raw: &str) -> Result<u8, InputError> {
    let age: i64 = raw.trim().parse().map_err(|e: ParseIntError| match e.kind() {
        // Still a number, just a very large one
        IntErrorKind::PosOverflow => InputError::AgeOutOfRange(i64::MAX),
        IntErrorKind::NegOverflow => InputError::AgeOutOfRange(i64::MIN),
        _ => InputError::NotANumber,
    })?;
    if age < i64::from(MIN_AGE) || age > i64::from(MAX_AGE) {
        return Err(InputError::AgeOutOfRange(age));
    }
    // In range, so it fits
    Ok(age as u8)
}

/// Returns the lower-cased city name when it is on the list
pub fn parse_city(raw: &str) -> Result<String, InputError> {
    let city = raw.trim().to_lowercase();
    if CITIES.contains(&city.as_str()) {
        Ok(city)
    } else {
        Err(InputError::UnknownCity(city))
    }
}

/// Capitalise the first letter of every word, hyphenated parts included
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_tokens() {
        assert_eq!(parse_sex("1"), Ok(Sex::Female));
        assert_eq!(parse_sex("Ж"), Ok(Sex::Female));
        assert_eq!(parse_sex("1 - Женский"), Ok(Sex::Female));
        assert_eq!(parse_sex("мужской"), Ok(Sex::Male));
        assert_eq!(parse_sex(" 2 "), Ok(Sex::Male));
        assert_eq!(parse_sex("3"), Err(InputError::UnknownSex));
        assert_eq!(parse_sex("женщина"), Err(InputError::UnknownSex));
    }

    #[test]
    fn test_age_boundaries() {
        assert_eq!(parse_age("18"), Ok(18));
        assert_eq!(parse_age("80"), Ok(80));
        assert_eq!(parse_age("17"), Err(InputError::AgeOutOfRange(17)));
        assert_eq!(parse_age("81"), Err(InputError::AgeOutOfRange(81)));
        assert_eq!(parse_age("-20"), Err(InputError::AgeOutOfRange(-20)));
    }

    #[test]
    fn test_huge_age_is_out_of_range() {
        assert_eq!(
            parse_age("100000000000000000000"),
            Err(InputError::AgeOutOfRange(i64::MAX))
        );
        assert_eq!(
            parse_age("-100000000000000000000"),
            Err(InputError::AgeOutOfRange(i64::MIN))
        );
        assert_eq!(
            InputError::AgeOutOfRange(i64::MAX).to_string(),
            "❌ Возраст должен быть от 18 до 80 лет"
        );
    }

    #[test]
    fn test_age_not_a_number() {
        assert_eq!(parse_age("двадцать"), Err(InputError::NotANumber));
        assert_eq!(parse_age("25 лет"), Err(InputError::NotANumber));
        assert_eq!(parse_age(""), Err(InputError::NotANumber));
    }

    #[test]
    fn test_city_membership() {
        assert_eq!(parse_city("Москва"), Ok("москва".to_string()));
        assert_eq!(parse_city(" москва "), Ok("москва".to_string()));
        assert_eq!(parse_city("НИЖНИЙ НОВГОРОД"), Ok("нижний новгород".to_string()));
        assert_eq!(parse_city("Moscow"), Err(InputError::UnknownCity("moscow".to_string())));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("москва"), "Москва");
        assert_eq!(title_case("ростов-на-дону"), "Ростов-На-Дону");
        assert_eq!(title_case("набережные челны"), "Набережные Челны");
    }

    #[test]
    fn test_validate_only_when_waiting() {
        assert_eq!(validate(Mode::Idle, "25"), Validation::NotWaiting);
        assert_eq!(validate(Mode::Browsing, "25"), Validation::NotWaiting);
        assert_eq!(validate(Mode::WaitingAge, "25"), Validation::Accepted(SettingValue::Age(25)));
        assert_eq!(
            validate(Mode::WaitingSex, "поиск"),
            Validation::Rejected(InputError::UnknownSex)
        );
    }

    #[test]
    fn test_confirmations() {
        assert_eq!(SettingValue::Sex(Sex::Female).confirmation(), "✅ Пол изменён на: Женский");
        assert_eq!(SettingValue::Age(30).confirmation(), "✅ Возраст изменён на: 30 лет");
        assert_eq!(
            SettingValue::City("санкт-петербург".to_string()).confirmation(),
            "✅ Город изменён на: Санкт-Петербург"
        );
    }
}

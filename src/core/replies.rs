//! Reply texts of the bot.

use crate::core::settings_input::title_case;
use crate::models::{Candidate, FavoriteEntry, UserProfile};

/// Favorites shown in one list reply
pub const FAVORITES_PAGE: usize = 10;

pub const PROFILE_UNAVAILABLE: &str = "❌ Не удалось получить информацию о вашем профиле.";
pub const START_FAILED: &str = "❌ Произошла ошибка при запуске. Попробуйте позже.";
pub const NEED_START: &str = "❌ Сначала нужно запустить бота командой /start";
pub const SEARCHING: &str = "🔍 Ищу подходящих людей для знакомства...";
pub const NO_CANDIDATES: &str =
    "😔 К сожалению, не нашел подходящих кандидатов. Попробуйте изменить параметры поиска в настройках.";
pub const SEARCH_FAILED: &str = "❌ Ошибка при поиске. Попробуйте позже.";
pub const NEED_SEARCH: &str = "❌ Сначала начните поиск";
pub const NO_CURRENT_CANDIDATE: &str = "❌ Нет текущего кандидата";
pub const RENDER_FAILED: &str = "❌ Ошибка при показе кандидата.";
pub const EXHAUSTED: &str = "🎉 Вы просмотрели всех найденных людей!\n\nХотите начать новый поиск?";
pub const ALREADY_FAVORITE: &str = "❌ Этот человек уже в вашем списке избранных";
pub const FAVORITE_FAILED: &str = "❌ Ошибка при добавлении в избранное.";
pub const BLACKLIST_FAILED: &str = "❌ Ошибка при добавлении в черный список.";
pub const FAVORITES_MENU: &str = "❤️ Избранные:";
pub const FAVORITES_EMPTY: &str =
    "💔 Ваш список избранных пуст.\n\nНачните поиск, чтобы найти интересных людей!";
pub const FAVORITES_FAILED: &str = "❌ Ошибка при получении избранных.";
pub const FAVORITES_CLEARED: &str = "🗑️ Список избранных очищен!";
pub const CLEAR_FAILED: &str = "❌ Ошибка при очистке избранных.";
pub const SETTINGS_FAILED: &str = "❌ Ошибка при получении настроек.";
pub const SAVE_FAILED: &str = "❌ Не удалось сохранить настройки. Попробуйте позже.";
pub const CANCELLED: &str = "❌ Отменено";
pub const MAIN_MENU: &str = "🏠 Главное меню:";
pub const GENERIC_FAILURE: &str = "❌ Произошла ошибка. Попробуйте позже.";

pub const ASK_SEX: &str = "🚻 Укажите ваш пол:

Отправьте:
1 - Женский
2 - Мужской

Это нужно, чтобы подбирать вам подходящих людей.";

pub const ASK_AGE: &str = "🎂 Укажите ваш возраст:

Отправьте число от 18 до 80.
Например: 25";

pub const ASK_CITY: &str = "🏙️ Укажите ваш город:

Отправьте название города.
Например: Москва

Доступные города:
• Москва
• Санкт-Петербург
• Новосибирск
• Красноярск";

pub const HELP: &str = "ℹ️ Справка по VKinder:

🔍 Поиск - поиск людей для знакомства
❤️ Избранные - управление списком избранных
⚙️ Настройки - пол, возраст и город для поиска

Во время поиска:
❤️ В избранное - добавить человека в избранные
👎 В черный список - больше не показывать
▶️ Следующий - перейти к следующему человеку";

const UNSPECIFIED: &str = "Не указан";

pub fn welcome(first_name: &str) -> String {
    format!(
        "👋 Привет, {}!

🤖 Я VKinder - бот для поиска людей для знакомств в ВКонтакте!

✨ Что я умею:
• Искать людей для знакомств по вашим параметрам
• Показывать самые популярные фото профилей
• Сохранять понравившихся людей в избранное
• Добавлять неподходящих в черный список

🚀 Давайте начнем! Выберите действие:",
        first_name
    )
}

pub fn unknown_command(raw: &str) -> String {
    format!("🤔 Не понимаю команду '{}'.\n\nВыберите действие из меню:", raw)
}

pub fn candidate_card(candidate: &Candidate) -> String {
    let age = match candidate.age {
        Some(age) => format!("{} лет", age),
        None => "Возраст не указан".to_string(),
    };
    let city = match &candidate.city {
        Some(city) => title_case(city),
        None => "Город не указан".to_string(),
    };

    format!(
        "👤 {} {}\n🎂 {}\n🏙️ {}\n🔗 {}\n\n📸 Популярные фотографии профиля:",
        candidate.first_name,
        candidate.last_name,
        age,
        city,
        candidate.profile_url()
    )
}

pub fn favorite_added(first_name: &str) -> String {
    format!("❤️ {} добавлен(а) в избранное!", first_name)
}

pub fn blacklisted(first_name: &str) -> String {
    format!("👎 {} добавлен(а) в черный список", first_name)
}

/// First page of favorites with a count of the rest
pub fn favorites_list(favorites: &[FavoriteEntry]) -> String {
    let mut message = String::from("❤️ Ваши избранные:\n\n");
    for (i, fav) in favorites.iter().take(FAVORITES_PAGE).enumerate() {
        message.push_str(&format!("{}. {} {}\n", i + 1, fav.first_name, fav.last_name));
        message.push_str(&format!("   🔗 {}\n\n", fav.profile_url()));
    }

    if favorites.len() > FAVORITES_PAGE {
        message.push_str(&format!(
            "... и еще {} человек(а)",
            favorites.len() - FAVORITES_PAGE
        ));
    }
    message
}

pub fn settings_summary(profile: &UserProfile) -> String {
    let age = match profile.age {
        Some(age) => format!("{} лет", age),
        None => UNSPECIFIED.to_string(),
    };
    let city = match &profile.city {
        Some(city) => title_case(city),
        None => UNSPECIFIED.to_string(),
    };

    format!(
        "⚙️ Ваши настройки поиска:\n\n🚻 Пол: {}\n🎂 Возраст: {}\n🏙️ Город: {}\n\nВыберите, что хотите изменить:",
        profile.sex.label(),
        age,
        city
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sex;

    fn favorite(i: i64) -> FavoriteEntry {
        FavoriteEntry {
            user_id: 1,
            candidate_id: i,
            first_name: format!("Имя{}", i),
            last_name: "Фамилия".to_string(),
            added_at: None,
        }
    }

    #[test]
    fn test_card_with_unknown_fields() {
        let card = candidate_card(&Candidate {
            id: 42,
            first_name: "Анна".to_string(),
            last_name: "Иванова".to_string(),
            age: None,
            city: None,
        });

        assert!(card.starts_with("👤 Анна Иванова\n"));
        assert!(card.contains("Возраст не указан"));
        assert!(card.contains("Город не указан"));
        assert!(card.contains("https://vk.com/id42"));
    }

    #[test]
    fn test_card_with_known_fields() {
        let card = candidate_card(&Candidate {
            id: 1,
            first_name: "Анна".to_string(),
            last_name: "Иванова".to_string(),
            age: Some(27),
            city: Some("нижний новгород".to_string()),
        });

        assert!(card.contains("🎂 27 лет"));
        assert!(card.contains("🏙️ Нижний Новгород"));
    }

    #[test]
    fn test_short_favorites_list() {
        let text = favorites_list(&[favorite(1), favorite(2)]);
        assert!(text.contains("1. Имя1 Фамилия"));
        assert!(text.contains("2. Имя2 Фамилия"));
        assert!(!text.contains("и еще"));
    }

    #[test]
    fn test_long_favorites_list_is_cut() {
        let favorites: Vec<FavoriteEntry> = (1..=13).map(favorite).collect();
        let text = favorites_list(&favorites);

        assert!(text.contains("10. Имя10 Фамилия"));
        assert!(!text.contains("11. Имя11"));
        assert!(text.ends_with("... и еще 3 человек(а)"));
    }

    #[test]
    fn test_settings_summary() {
        let mut profile = UserProfile {
            user_id: 1,
            first_name: "Анна".to_string(),
            last_name: "Иванова".to_string(),
            sex: Sex::Unspecified,
            age: None,
            city: None,
            created_at: None,
        };
        let text = settings_summary(&profile);
        assert!(text.contains("🚻 Пол: Не указан"));
        assert!(text.contains("🎂 Возраст: Не указан"));
        assert!(text.contains("🏙️ Город: Не указан"));

        profile.sex = Sex::Female;
        profile.age = Some(30);
        profile.city = Some("казань".to_string());
        let text = settings_summary(&profile);
        assert!(text.contains("🚻 Пол: Женский"));
        assert!(text.contains("🎂 Возраст: 30 лет"));
        assert!(text.contains("🏙️ Город: Казань"));
    }
}

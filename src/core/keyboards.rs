/// Choice sets offered together with a reply
///
/// Only the button labels are defined here; how they are drawn is up to the
/// transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
    Main,
    Search,
    Settings,
    Favorites,
    SexChoice,
    CityChoice,
    CancelOnly,
}

impl Keyboard {
    /// Button labels, row by row
    pub fn rows(self) -> &'static [&'static [&'static str]] {
        match self {
            Keyboard::Main => &[
                &["🔍 Поиск", "❤️ Избранные"],
                &["Настройки", "ℹ️ Помощь"],
            ],
            Keyboard::Search => &[
                &["❤️ В избранное", "👎 В черный список"],
                &["▶️ Следующий", "🏠 Главное меню"],
            ],
            Keyboard::Settings => &[
                &["🚻 Изменить пол", "🎂 Изменить возраст"],
                &["🏙️ Изменить город", "📊 Показать настройки"],
                &["🏠 Главное меню"],
            ],
            Keyboard::Favorites => &[
                &["📋 Показать избранных", "🗑️ Очистить избранных"],
                &["🏠 Главное меню"],
            ],
            Keyboard::SexChoice => &[&["1 - Женский", "2 - Мужской"], &["❌ Отмена"]],
            Keyboard::CityChoice => &[
                &["Москва", "Санкт-Петербург"],
                &["Новосибирск", "Красноярск"],
                &["❌ Отмена"],
            ],
            Keyboard::CancelOnly => &[&["❌ Отмена"]],
        }
    }

    /// Keyboards are dismissed after one press
    pub fn one_time(self) -> bool {
        true
    }
}

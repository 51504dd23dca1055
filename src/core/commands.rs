/// Canonical intent behind a user's text or button press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Search,
    Next,
    Favorite,
    Blacklist,
    FavoritesMenu,
    ShowFavorites,
    ClearFavorites,
    Settings,
    ChangeSex,
    ChangeAge,
    ChangeCity,
    ShowSettings,
    MainMenu,
    Help,
    Cancel,
}

/// Synonym sets, matched exactly after lower-casing and trimming.
/// Entries are kept as the buttons and chat habits of the bot spell them.
const SYNONYMS: &[(Command, &[&str])] = &[
    (Command::Start, &["/start", "начать", "привет", "старт"]),
    (Command::Search, &["🔍 поиск", "поиск"]),
    (Command::Next, &["▶️ следующий", "следующий", "далее"]),
    (Command::Favorite, &["❤️ в избранное", "в избранное", "лайк"]),
    (Command::Blacklist, &["👎 в черный список", "в черный список", "дизлайк"]),
    (Command::FavoritesMenu, &["❤️ избранные", "избранные"]),
    (Command::ShowFavorites, &["📋 показать избранных", "показать избранных"]),
    (Command::ClearFavorites, &["🗑️ очистить избранных", "очистить избранных"]),
    (
        Command::Settings,
        &["⚙️ настройки", "настройки", "⚙ настройки", "настройки⚙️", "настройка"],
    ),
    (Command::ChangeSex, &["🚻 изменить пол", "изменить пол", "пол"]),
    (Command::ChangeAge, &["🎂 изменить возраст", "изменить возраст", "возраст"]),
    (
        Command::ChangeCity,
        &["🏙️ изменить город", "изменить город", "город", "🏙 изменить город"],
    ),
    (Command::ShowSettings, &["📊 показать настройки", "показать настройки"]),
    (Command::MainMenu, &["🏠 главное меню", "главное меню", "меню"]),
    (Command::Help, &["ℹ️ помощь", "помощь", "help"]),
    (Command::Cancel, &["❌ отмена", "отмена"]),
];

/// Emoji the keyboards put in front of button labels
const LEADING_GLYPHS: &[char] = &[
    '🔍', '❤', '▶', '👎', '📋', '🗑', '⚙', '🚻', '🎂', '🏙', '📊', '🏠', 'ℹ', '❌',
];

const VARIATION_SELECTOR: char = '\u{FE0F}';

/// Lower-case and trim raw input
pub fn clean(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Drop known leading emoji glyphs together with their variation selectors
/// and the whitespace after them
pub fn strip_leading_glyphs(text: &str) -> &str {
    let mut rest = text;
    loop {
        let trimmed = rest.trim_start_matches(LEADING_GLYPHS);
        let trimmed = trimmed.trim_start_matches(VARIATION_SELECTOR).trim_start();
        if trimmed.len() == rest.len() {
            return rest;
        }
        rest = trimmed;
    }
}

fn lookup(text: &str) -> Option<Command> {
    SYNONYMS
        .iter()
        .find(|(_, synonyms)| synonyms.contains(&text))
        .map(|(command, _)| *command)
}

/// Map raw inbound text to its canonical command, `None` for unknown text
pub fn normalize(raw: &str) -> Option<Command> {
    let text = clean(raw);
    if let Some(command) = lookup(&text) {
        return Some(command);
    }

    let stripped = strip_leading_glyphs(&text);
    if stripped.len() != text.len() {
        return lookup(stripped);
    }
    None
}

use std::sync::Arc;
use tracing::{debug, error, info};
use crate::core::commands::{normalize, Command};
use crate::core::inbox::Inbox;
use crate::core::keyboards::Keyboard;
use crate::core::replies;
use crate::core::session::{Browser, Mode, Position, Session, SessionStore};
use crate::core::settings_input::{validate, SettingValue, Validation};
use crate::models::OutboundMessage;
use crate::services::gateway::{
    CollaboratorResult, FavoritesGateway, PhotoService, ProfileGateway, SearchService, Transport,
    UserDirectory,
};

/// Photos attached to a candidate card
pub const MAX_PHOTOS: usize = 3;

/// Everything the router talks to
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn Transport>,
    pub directory: Arc<dyn UserDirectory>,
    pub profiles: Arc<dyn ProfileGateway>,
    pub favorites: Arc<dyn FavoritesGateway>,
    pub search: Arc<dyn SearchService>,
    pub photos: Arc<dyn PhotoService>,
}

/// Whether the settings validator took the message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumption {
    Consumed,
    NotConsumed,
}

/// Dialogue state machine: turns one inbound message into replies
///
/// # Dispatch order
/// 1. Cancel always wins and resets the session
/// 2. A session waiting for a setting takes the message as a value
/// 3. Unknown text gets a hint with the main menu
/// 4. Everything else goes to its command handler
///
/// Failures of collaborators are caught per command, logged, and answered
/// with a generic message, so `handle` never fails.
///
/// Concurrent `handle` calls for one user run one at a time, in no fixed
/// order. Callers that need arrival order, like the callback endpoint, go
/// through `submit`.
#[derive(Clone)]
pub struct DialogueRouter {
    sessions: SessionStore,
    collaborators: Collaborators,
    inbox: Inbox,
}

impl DialogueRouter {
    pub fn new(collaborators: Collaborators, sessions: SessionStore) -> Self {
        Self {
            sessions,
            collaborators,
            inbox: Inbox::default(),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn inbox(&self) -> &Inbox {
        &self.inbox
    }

    /// Handle one message from a user
    pub async fn handle(&self, user_id: i64, raw: &str) {
        let mut session = self.sessions.lock(user_id).await;
        self.process(user_id, &mut session, raw).await;
        self.sessions.store(session).await;
    }

    /// Queue a message behind the ones the same user sent before it
    ///
    /// Returns at once. Each user with queued messages gets one task that
    /// handles them in the order they were submitted.
    pub fn submit(&self, user_id: i64, raw: impl Into<String>) {
        self.inbox.submit(self, user_id, raw.into());
    }

    async fn process(&self, user_id: i64, session: &mut Session, raw: &str) {
        let command = normalize(raw);

        if command == Some(Command::Cancel) {
            session.reset();
            self.reply(user_id, replies::CANCELLED, Some(Keyboard::Main)).await;
            return;
        }

        if self.try_consume(user_id, session, raw).await == Consumption::Consumed {
            return;
        }

        let Some(command) = command else {
            info!("Unknown command from {}: '{}'", user_id, raw);
            self.reply(user_id, replies::unknown_command(raw), Some(Keyboard::Main))
                .await;
            return;
        };

        debug!("User {} -> {:?} (mode {:?})", user_id, command, session.mode());
        self.dispatch(user_id, session, command).await;
    }

    /// Offer a message to the settings validator
    ///
    /// While the session waits for a value every message is taken, valid
    /// or not.
    pub async fn try_consume(&self, user_id: i64, session: &mut Session, raw: &str) -> Consumption {
        match validate(session.mode(), raw) {
            Validation::NotWaiting => Consumption::NotConsumed,
            Validation::Rejected(e) => {
                debug!("Rejected settings input from {}: {:?}", user_id, e);
                self.reply(user_id, e.to_string(), None).await;
                Consumption::Consumed
            }
            Validation::Accepted(value) => {
                match self.store_setting(user_id, &value).await {
                    Ok(()) => {
                        info!("User {} changed setting: {:?}", user_id, value);
                        session.reset();
                        self.reply(user_id, value.confirmation(), Some(Keyboard::Settings))
                            .await;
                    }
                    Err(e) => {
                        error!("Failed to store setting for user {}: {}", user_id, e);
                        self.reply(user_id, replies::SAVE_FAILED, None).await;
                    }
                }
                Consumption::Consumed
            }
        }
    }

    async fn store_setting(&self, user_id: i64, value: &SettingValue) -> CollaboratorResult<()> {
        let profiles = &self.collaborators.profiles;
        match value {
            SettingValue::Sex(sex) => profiles.update_sex(user_id, *sex).await,
            SettingValue::Age(age) => profiles.update_age(user_id, *age).await,
            SettingValue::City(city) => profiles.update_city(user_id, city).await,
        }
    }

    async fn dispatch(&self, user_id: i64, session: &mut Session, command: Command) {
        let result = match command {
            Command::Start => self.start(user_id).await,
            Command::Search => self.search(user_id, session).await,
            Command::Next => {
                self.next(user_id, session).await;
                Ok(())
            }
            Command::Favorite => self.favorite(user_id, session).await,
            Command::Blacklist => self.blacklist(user_id, session).await,
            Command::FavoritesMenu => {
                self.reply(user_id, replies::FAVORITES_MENU, Some(Keyboard::Favorites))
                    .await;
                Ok(())
            }
            Command::ShowFavorites => self.show_favorites(user_id).await,
            Command::ClearFavorites => self.clear_favorites(user_id).await,
            Command::Settings | Command::ShowSettings => self.settings(user_id).await,
            Command::ChangeSex => {
                self.await_setting(user_id, session, Mode::WaitingSex).await;
                Ok(())
            }
            Command::ChangeAge => {
                self.await_setting(user_id, session, Mode::WaitingAge).await;
                Ok(())
            }
            Command::ChangeCity => {
                self.await_setting(user_id, session, Mode::WaitingCity).await;
                Ok(())
            }
            Command::MainMenu => {
                self.reply(user_id, replies::MAIN_MENU, Some(Keyboard::Main)).await;
                Ok(())
            }
            Command::Help => {
                self.reply(user_id, replies::HELP, Some(Keyboard::Main)).await;
                Ok(())
            }
            // Handled before dispatch
            Command::Cancel => Ok(()),
        };

        if let Err(e) = result {
            error!("{:?} failed for user {}: {}", command, user_id, e);
            self.reply(user_id, failure_reply(command), None).await;
        }
    }

    async fn start(&self, user_id: i64) -> CollaboratorResult<()> {
        let Some(info) = self.collaborators.directory.user_info(user_id).await? else {
            self.reply(user_id, replies::PROFILE_UNAVAILABLE, None).await;
            return Ok(());
        };

        let profile = self.collaborators.profiles.create_profile(&info).await?;
        info!("Profile ready for user {}", user_id);

        self.reply(user_id, replies::welcome(&profile.first_name), Some(Keyboard::Main))
            .await;
        Ok(())
    }

    async fn search(&self, user_id: i64, session: &mut Session) -> CollaboratorResult<()> {
        let Some(profile) = self.collaborators.profiles.get_profile(user_id).await? else {
            self.reply(user_id, replies::NEED_START, None).await;
            return Ok(());
        };

        self.reply(user_id, replies::SEARCHING, None).await;

        let candidates = self.collaborators.search.search(&profile).await?;
        info!("Found {} candidates for user {}", candidates.len(), user_id);

        match Browser::new(candidates) {
            Some(browser) => {
                *session = Session::Browsing(browser);
                self.show_current(user_id, session).await;
            }
            None => {
                session.reset();
                self.reply(user_id, replies::NO_CANDIDATES, Some(Keyboard::Main))
                    .await;
            }
        }
        Ok(())
    }

    /// Move to the next candidate; outside browsing only a hint is sent
    async fn next(&self, user_id: i64, session: &mut Session) {
        let Some(browser) = session.browser_mut() else {
            self.reply(user_id, replies::NEED_SEARCH, Some(Keyboard::Main)).await;
            return;
        };

        browser.advance();
        self.show_current(user_id, session).await;
    }

    /// Show the candidate at the cursor, or close the browse list when it
    /// is used up. The only place a candidate becomes current.
    async fn show_current(&self, user_id: i64, session: &mut Session) {
        let next = match session.browser() {
            Some(browser) => match browser.position() {
                Position::Rendering(_, candidate) => Some(candidate.clone()),
                Position::Exhausted => None,
            },
            None => return,
        };

        let Some(candidate) = next else {
            info!("User {} has seen every candidate", user_id);
            self.reply(user_id, replies::EXHAUSTED, Some(Keyboard::Main)).await;
            session.reset();
            return;
        };

        let photos = match self.collaborators.photos.popular_photos(candidate.id).await {
            Ok(photos) => photos,
            Err(e) => {
                error!("Failed to fetch photos of {} for user {}: {}", candidate.id, user_id, e);
                self.reply(user_id, replies::RENDER_FAILED, None).await;
                return;
            }
        };

        let message = OutboundMessage::text(user_id, replies::candidate_card(&candidate))
            .with_keyboard(Keyboard::Search)
            .with_attachments(photos.into_iter().take(MAX_PHOTOS).collect());
        self.deliver(message).await;

        if let Some(browser) = session.browser_mut() {
            browser.mark_shown();
        }
    }

    async fn favorite(&self, user_id: i64, session: &mut Session) -> CollaboratorResult<()> {
        let Some(browser) = session.browser() else {
            self.reply(user_id, replies::NEED_SEARCH, Some(Keyboard::Main)).await;
            return Ok(());
        };
        let Some(candidate) = browser.current().cloned() else {
            self.reply(user_id, replies::NO_CURRENT_CANDIDATE, None).await;
            return Ok(());
        };

        let added = self
            .collaborators
            .favorites
            .add_favorite(user_id, candidate.id, &candidate.first_name, &candidate.last_name)
            .await?;

        if added {
            self.reply(user_id, replies::favorite_added(&candidate.first_name), None)
                .await;
        } else {
            debug!("Candidate {} already a favorite of {}", candidate.id, user_id);
            self.reply(user_id, replies::ALREADY_FAVORITE, None).await;
        }

        self.next(user_id, session).await;
        Ok(())
    }

    async fn blacklist(&self, user_id: i64, session: &mut Session) -> CollaboratorResult<()> {
        let Some(browser) = session.browser() else {
            self.reply(user_id, replies::NEED_SEARCH, Some(Keyboard::Main)).await;
            return Ok(());
        };
        let Some(candidate) = browser.current().cloned() else {
            self.reply(user_id, replies::NO_CURRENT_CANDIDATE, None).await;
            return Ok(());
        };

        self.collaborators
            .favorites
            .add_blacklist(user_id, candidate.id)
            .await?;
        self.reply(user_id, replies::blacklisted(&candidate.first_name), None)
            .await;

        self.next(user_id, session).await;
        Ok(())
    }

    async fn show_favorites(&self, user_id: i64) -> CollaboratorResult<()> {
        let favorites = self.collaborators.favorites.list_favorites(user_id).await?;

        if favorites.is_empty() {
            self.reply(user_id, replies::FAVORITES_EMPTY, Some(Keyboard::Main))
                .await;
        } else {
            self.reply(
                user_id,
                replies::favorites_list(&favorites),
                Some(Keyboard::Favorites),
            )
            .await;
        }
        Ok(())
    }

    async fn clear_favorites(&self, user_id: i64) -> CollaboratorResult<()> {
        self.collaborators.favorites.clear_favorites(user_id).await?;
        info!("Cleared favorites of user {}", user_id);
        self.reply(user_id, replies::FAVORITES_CLEARED, Some(Keyboard::Main))
            .await;
        Ok(())
    }

    async fn settings(&self, user_id: i64) -> CollaboratorResult<()> {
        match self.collaborators.profiles.get_profile(user_id).await? {
            Some(profile) => {
                self.reply(
                    user_id,
                    replies::settings_summary(&profile),
                    Some(Keyboard::Settings),
                )
                .await;
            }
            None => self.reply(user_id, replies::NEED_START, None).await,
        }
        Ok(())
    }

    /// Switch to waiting for a settings value, dropping any browse list
    async fn await_setting(&self, user_id: i64, session: &mut Session, mode: Mode) {
        let (prompt, keyboard) = match mode {
            Mode::WaitingSex => (replies::ASK_SEX, Keyboard::SexChoice),
            Mode::WaitingAge => (replies::ASK_AGE, Keyboard::CancelOnly),
            Mode::WaitingCity => (replies::ASK_CITY, Keyboard::CityChoice),
            Mode::Idle | Mode::Browsing => return,
        };

        if let Some(waiting) = Session::waiting(mode) {
            *session = waiting;
        }
        self.reply(user_id, prompt, Some(keyboard)).await;
    }

    async fn reply(&self, user_id: i64, text: impl Into<String>, keyboard: Option<Keyboard>) {
        let mut message = OutboundMessage::text(user_id, text);
        message.keyboard = keyboard;
        self.deliver(message).await;
    }

    /// Send failures are logged and otherwise ignored
    async fn deliver(&self, message: OutboundMessage) {
        if let Err(e) = self.collaborators.transport.send(&message).await {
            error!("Failed to send message to user {}: {}", message.user_id, e);
        }
    }
}

/// What a user is told when a command's collaborator fails
fn failure_reply(command: Command) -> &'static str {
    match command {
        Command::Start => replies::START_FAILED,
        Command::Search => replies::SEARCH_FAILED,
        Command::Next => replies::RENDER_FAILED,
        Command::Favorite => replies::FAVORITE_FAILED,
        Command::Blacklist => replies::BLACKLIST_FAILED,
        Command::ShowFavorites => replies::FAVORITES_FAILED,
        Command::ClearFavorites => replies::CLEAR_FAILED,
        Command::Settings | Command::ShowSettings => replies::SETTINGS_FAILED,
        _ => replies::GENERIC_FAILURE,
    }
}

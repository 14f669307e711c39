//! Command dispatcher wiring the layers together.

use std::sync::Arc;

use color_eyre::eyre::{Result, bail, eyre};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::console;
use super::watch::Watcher;
use crate::application::{AuthResponse, SessionManager, TokenStore};
use crate::domain::entities::{AlbumFilter, ArtistId, LoginCredentials, PageQuery, Registration};
use crate::domain::{CredentialStoragePort, DesktopNotifierPort};
use crate::infrastructure::config::PageArgs;
#[cfg(feature = "keyring")]
use crate::infrastructure::KeyringCredentialStorage;
use crate::infrastructure::{
    AlbumsApi, AppConfig, ArtistsApi, CatalogAuthClient, Command, DesktopNotifier, HttpGateway,
    MemoryCredentialStorage, NotificationChannel,
};

pub struct App {
    session: Arc<SessionManager>,
    artists: ArtistsApi,
    albums: AlbumsApi,
    channel: Arc<NotificationChannel>,
    notifier: Arc<dyn DesktopNotifierPort>,
    session_events: JoinHandle<()>,
}

impl App {
    /// Builds every component from `config`. Must run inside a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let token_store = Arc::new(TokenStore::new(credential_storage(config.no_persist)));
        let gateway = Arc::new(HttpGateway::new(
            config.api_url.clone(),
            token_store.clone(),
            config.request_timeout(),
        )?);

        let session = Arc::new(SessionManager::new(
            Arc::new(CatalogAuthClient::new(gateway.clone())),
            token_store,
        ));
        let session_events = session.follow_events(gateway.subscribe_events());

        let channel = Arc::new(NotificationChannel::stomp(
            config.ws_url.clone(),
            config.channel_config(),
        ));

        info!(api = %config.api_url, ws = %config.ws_url, "Application initialized");

        Ok(Self {
            session,
            artists: ArtistsApi::new(gateway.clone()),
            albums: AlbumsApi::new(gateway),
            channel,
            notifier: Arc::new(DesktopNotifier::new(config.notifications.desktop)),
            session_events,
        })
    }

    /// Runs one command to completion.
    ///
    /// # Errors
    ///
    /// Returns the catalog, storage or validation error that stopped it.
    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Login { username, password } => {
                let password = required_password(password)?;
                let response = self
                    .session
                    .login(&LoginCredentials::new(username, password))
                    .await?;
                report_login(&response);
            }
            Command::Register {
                username,
                email,
                password,
                full_name,
            } => {
                let password = required_password(password)?;
                let mut registration = Registration::new(username, email, password);
                if let Some(full_name) = full_name {
                    registration = registration.with_full_name(full_name);
                }
                let response = self.session.register(&registration).await?;
                report_login(&response);
            }
            Command::Logout => {
                self.session.logout().await?;
                println!("Logged out.");
            }
            Command::Whoami => match self.restore().await {
                Some(_) => match self.session.current_user() {
                    Some(user) => println!("{}", console::user(&user)),
                    None => println!("Logged in, no profile stored."),
                },
                None => println!("Not logged in."),
            },
            Command::Artists { page, name } => {
                self.restore().await;
                let listing = self.artists.list(&page_query(page), name.as_deref()).await?;
                println!("{}", console::artists(&listing));
            }
            Command::Albums {
                page,
                title,
                artist,
                artist_id,
            } => {
                self.restore().await;
                let filter = AlbumFilter {
                    title,
                    artist_name: artist,
                    artist_id: artist_id.map(ArtistId),
                };
                let listing = self.albums.list(&page_query(page), &filter).await?;
                println!("{}", console::albums(&listing));
            }
            Command::Watch { count } => self.watch(count).await?,
        }
        Ok(())
    }

    async fn restore(&self) -> Option<AuthResponse> {
        let restored = self.session.restore().await;
        if let Some(response) = &restored {
            debug!(user = response.display_name(), "Using stored session");
        }
        restored
    }

    async fn watch(&self, count: Option<usize>) -> Result<()> {
        let Some(response) = self.restore().await else {
            bail!("Not logged in, run `albumwire login` first");
        };
        println!("Watching album changes as {}. Press Ctrl-C to stop.", response.display_name());

        let outcome = Watcher::new(self.session.clone(), self.channel.clone(), self.notifier.clone())
            .with_album_lookup(self.albums.clone())
            .with_limit(count)
            .run(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            })
            .await?;

        println!("Stopped: {}.", outcome.reason);
        println!("{}", console::buffer_summary(&outcome.buffer));
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.session_events.abort();
    }
}

#[cfg(feature = "keyring")]
fn credential_storage(no_persist: bool) -> Arc<dyn CredentialStoragePort> {
    if no_persist {
        debug!("Keeping credentials in memory");
        Arc::new(MemoryCredentialStorage::new())
    } else {
        Arc::new(KeyringCredentialStorage::new())
    }
}

#[cfg(not(feature = "keyring"))]
fn credential_storage(_no_persist: bool) -> Arc<dyn CredentialStoragePort> {
    debug!("Built without keyring support, keeping credentials in memory");
    Arc::new(MemoryCredentialStorage::new())
}

fn required_password(password: Option<String>) -> Result<String> {
    password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| eyre!("A password is required, pass --password or set ALBUMWIRE_PASSWORD"))
}

fn page_query(args: PageArgs) -> PageQuery {
    let query = PageQuery::new(args.page, args.size);
    match args.sort {
        Some(sort) => query.sorted_by(sort),
        None => query,
    }
}

fn report_login(response: &AuthResponse) {
    println!("Logged in as {} via {}.", response.display_name(), response.source);
    if !response.persisted {
        println!("Credentials are kept for this run only.");
    }
}

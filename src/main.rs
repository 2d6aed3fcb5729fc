use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use memehub::api::{ApiClient, MemeQuery};
use memehub::config::{Cli, Command, Config};
use memehub::controllers::{
    FeedController, MyMemesController, PostContext, PostItemController, ReactionOutcome,
    SubmitOutcome, UploadForm, LOGIN_TO_REACT,
};
use memehub::forms::{ImageFile, RegisterForm};
use memehub::models::Meme;
use memehub::nav::{GuardDecision, Navigator, Route};
use memehub::prompt::{Prompt, TerminalPrompt};
use memehub::render;
use memehub::session::{AuthOutcome, SessionStore};
use memehub::storage::{FileStorage, SessionStorage};

struct App {
    config: Config,
    client: ApiClient,
    session: SessionStore,
    navigator: Navigator,
    prompt: TerminalPrompt,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    tracing::debug!("Session file: {}", config.session_path().display());

    let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::new(config.session_path()));
    let client = ApiClient::with_timeout(
        &config.api.base_url,
        storage,
        Duration::from_secs(config.api.timeout_secs),
    )
    .context("Invalid API base URL")?;

    let session = SessionStore::new(client.clone());
    let navigator = Navigator::new(client.subscribe());
    session.restore();

    let mut app = App {
        config,
        client,
        session,
        navigator,
        prompt: TerminalPrompt::new(cli.yes),
    };

    // A failed login also yields a 401; only a session that existed can expire.
    let had_session = app.session.is_authenticated();
    let result = app.run(cli.command).await;

    if app.navigator.poll_events() && had_session {
        eprintln!(
            "Your session has expired. Please log in again ({}).",
            app.navigator.current()
        );
    }
    result
}

impl App {
    async fn run(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Register {
                username,
                email,
                password,
                confirm_password,
            } => {
                let form = RegisterForm {
                    confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                    username,
                    email,
                    password,
                };
                form.validate()?;
                match self.session.register(&form.username, &form.email, &form.password).await {
                    AuthOutcome::Success(user) => println!("Welcome, @{}!", user.username),
                    AuthOutcome::Failure(message) => bail!(message),
                }
            }
            Command::Login {
                email,
                password,
                latitude,
                longitude,
            } => {
                match self.session.login(&email, &password).await {
                    AuthOutcome::Success(user) => println!("Logged in as @{}", user.username),
                    AuthOutcome::Failure(message) => bail!(message),
                }
                if let (Some(lat), Some(lon)) = (latitude, longitude) {
                    if let AuthOutcome::Failure(message) = self.session.update_location(lat, lon).await {
                        eprintln!("Location not updated: {}", message);
                    }
                }
            }
            Command::Logout => {
                self.session.logout();
                println!("Logged out");
            }
            Command::Whoami => match self.session.current_user() {
                Some(user) => println!("@{} <{}>", user.username, user.email),
                None => println!("Not logged in"),
            },
            Command::Feed { sort } => {
                let mut feed = self.feed();
                feed.set_sort(sort).await;
                self.print_feed(&feed, "No memes yet. Be the first to share!");
            }
            Command::Search {
                query,
                category,
                nearby,
            } => {
                let mut feed = self.feed();
                if nearby {
                    if !feed.show_nearby(&self.session, &self.prompt).await {
                        return Ok(());
                    }
                } else {
                    feed.search(query.unwrap_or_default(), category).await;
                }
                println!("Search Results ({})", feed.memes().len());
                self.print_feed(&feed, "No memes found. Try different search terms or filters.");
            }
            Command::Mine => {
                self.require(Route::MyMemes)?;
                let mut mine = MyMemesController::new(self.client.clone());
                mine.refresh().await;
                print!(
                    "{}",
                    render::render_feed(
                        mine.memes(),
                        mine.status(),
                        "You haven't uploaded any memes yet.",
                        &self.config.asset_base_url(),
                    )
                );
            }
            Command::Upload {
                title,
                caption,
                category,
                file,
                url,
            } => {
                let mut form = UploadForm::new();
                form.draft.title = title;
                form.draft.caption = caption;
                form.draft.category = category;
                if let Some(path) = file {
                    let image = ImageFile::open(&path).await?;
                    let preview = form.draft.select_file(image);
                    println!("{}", render::render_preview(&preview));
                }
                if let Some(url) = url {
                    form.draft.set_image_url(url)?;
                }
                match form.submit(&self.client, &self.session, &self.prompt, || {}).await {
                    SubmitOutcome::Uploaded => {}
                    SubmitOutcome::Invalid(message) | SubmitOutcome::Failed(message) => bail!(message),
                }
            }
            Command::Edit {
                id,
                title,
                caption,
                category,
            } => {
                self.require(Route::MyMemes)?;
                let mut mine = MyMemesController::new(self.client.clone());
                mine.refresh().await;
                if !mine.begin_edit(id) {
                    bail!("Meme {} is not one of yours", id);
                }
                if let Some(draft) = mine.editing_mut() {
                    if let Some(title) = title {
                        draft.title = title;
                    }
                    if let Some(caption) = caption {
                        draft.caption = caption;
                    }
                    if let Some(category) = category {
                        draft.category = category;
                    }
                }
                if !mine.save_edit(&self.prompt).await {
                    bail!("Meme {} was not updated", id);
                }
            }
            Command::Delete { id } => {
                self.require(Route::MyMemes)?;
                let mut mine = MyMemesController::new(self.client.clone());
                if !mine.delete(id, &self.prompt).await {
                    bail!("Meme {} was not deleted", id);
                }
            }
            Command::React { id, kind } => {
                // Gate before the lookup so a logged-out reaction sends nothing.
                if !self.session.is_authenticated() {
                    self.prompt.alert(LOGIN_TO_REACT);
                    return Ok(());
                }
                let meme = self.find_meme(id).await?;
                let mut item = PostItemController::new(meme, PostContext::Feed);
                match item
                    .submit_reaction(kind, &self.client, &self.session, &self.prompt)
                    .await
                {
                    ReactionOutcome::Recorded => self.print_item(&item),
                    ReactionOutcome::LoginRequired => {}
                    ReactionOutcome::Failed(message) => bail!(message),
                }
            }
            Command::Reactions { id } => {
                let meme = self.find_meme(id).await?;
                let mut item = PostItemController::new(meme, PostContext::Feed);
                item.load(&self.client, &self.session).await;
                self.print_item(&item);
            }
        }
        Ok(())
    }

    fn feed(&self) -> FeedController {
        FeedController::with_radius(self.client.clone(), self.config.feed.nearby_radius_km)
    }

    fn require(&mut self, route: Route) -> anyhow::Result<()> {
        match self.navigator.navigate(route, &self.session) {
            GuardDecision::Admit => Ok(()),
            GuardDecision::Redirect(target) => {
                self.prompt.alert(&format!("Please login first ({})", target));
                Err(anyhow!("{} requires login", route))
            }
            GuardDecision::Pending => Err(anyhow!("Session is still loading")),
        }
    }

    /// There is no single-meme endpoint; look in the public list and then in
    /// the viewer's own uploads.
    async fn find_meme(&self, id: i64) -> anyhow::Result<Meme> {
        let memes = self.client.list_memes(&MemeQuery::default()).await?;
        if let Some(meme) = memes.into_iter().find(|m| m.id == id) {
            return Ok(meme);
        }
        if self.session.is_authenticated() {
            let mine = self.client.my_memes().await?;
            if let Some(meme) = mine.into_iter().find(|m| m.id == id) {
                return Ok(meme);
            }
        }
        bail!("Meme {} not found", id)
    }

    fn print_feed(&self, feed: &FeedController, empty_message: &str) {
        print!(
            "{}",
            render::render_feed(feed.memes(), feed.status(), empty_message, &self.config.asset_base_url())
        );
    }

    fn print_item(&self, item: &PostItemController) {
        print!(
            "{}",
            render::render_card(
                item.meme(),
                Some(item.counts()),
                item.my_reaction(),
                &self.config.asset_base_url(),
            )
        );
    }
}

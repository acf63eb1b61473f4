use empathy_chat::app::{App, InitProps};
use empathy_chat::backend::new_backend;
use empathy_chat::cli::Command;
use empathy_chat::config::{Configuration, init_logger, verbose};
use empathy_chat::session::new_session;
use empathy_chat::storage::new_storage;
use eyre::{Context, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Command::new();
    if cmd.version() {
        cmd.print_version();
        return Ok(());
    }

    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let config = cmd.get_config()?;
    init_logger(&config.log)?;
    Configuration::init(config.clone())?;
    verbose!("[+] Logger initialized");

    verbose!("[+] Initializing backend...");
    let backend = new_backend(&config.backend);
    verbose!("[+] Backend {} uses {}", backend.name(), config.backend.endpoint);

    verbose!("[+] Initializing storage...");
    let storage = new_storage(&config.storage)
        .await
        .wrap_err("initializing storage")?;
    verbose!("[+] Storage initialized");

    let session = new_session(&config.session);
    match session.current_user().await? {
        Some(user) => verbose!("[+] Signed in as {}", user.email().unwrap_or(user.id())),
        None => verbose!("[!] No session user, conversations will not be saved"),
    }

    let mut app = App::new(InitProps {
        backend,
        storage,
        session,
    });

    if cmd.history() {
        return app.print_history().await;
    }

    if let Some(message) = cmd.message() {
        return app.send_once(message).await;
    }

    if let Err(err) = app.run().await {
        eprintln!("Error: {}", err);
    }
    Ok(())
}

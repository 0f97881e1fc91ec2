//! ClientBridge Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;

use teloxide::{prelude::*, types::Update};
use teloxide::dispatching::UpdateHandler;
use teloxide::utils::command::BotCommands as TeloxideBotCommands;
use tracing::{error, info, warn};

use ClientBridge::{
    config::Settings,
    handlers::{callbacks, commands::{admin, help, start}, messages},
    models::event::AdminAction,
    services::ServiceFactory,
    storage::IdentityStore,
    transport::{TelegramTransport, Transport},
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    logging::init_logging(&settings.logging)?;

    info!("Starting ClientBridge Telegram Bot...");

    // Open the identity store, recovering the last committed state
    info!("Opening identity store...");
    let store = IdentityStore::open(&settings.storage.snapshot_path).await?;

    // Seed bootstrap admins from configuration
    store.seed_admins(&settings.bot.admin_ids).await?;

    // Initialize bot and transport
    let bot = Bot::new(&settings.bot.token);
    let transport: Arc<dyn Transport> = Arc::new(TelegramTransport::new(bot.clone()));

    // Initialize services
    info!("Initializing services...");
    let services = ServiceFactory::new(store, transport, &settings);
    let services_arc = Arc::new(services);

    info!("Setting up bot handlers...");
    let handler = create_handler();

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![services_arc])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd);
        })
        .enable_ctrlc_handler()
        .build();

    info!("ClientBridge bot is ready, starting polling...");
    dispatcher.dispatch().await;

    info!("ClientBridge bot has been shut down.");
    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    use teloxide::dispatching::UpdateFilterExt;

    dptree::entry()
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<BotCommands>()
                        .endpoint(handle_commands),
                )
                .branch(dptree::endpoint(handle_messages)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callbacks))
}

#[derive(TeloxideBotCommands, Clone)]
#[command(rename_rule = "lowercase", parse_with = "split", description = "ClientBridge Bot Commands")]
enum BotCommands {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show help information")]
    Help,
    #[command(description = "List clients awaiting approval (admin only)")]
    Pending,
    #[command(description = "Approve a pending client (admin only)")]
    Approve(i64),
    #[command(description = "Reject a pending client (admin only)")]
    Reject(i64),
    #[command(description = "Return a client to the pending queue (admin only)")]
    Reset(i64),
    #[command(description = "Bind a client to a registered group (admin only)")]
    Assign(i64, i64),
    #[command(description = "Register the current group (admin only)")]
    Register,
    #[command(description = "Deregister a group (admin only)")]
    DeleteGroup(i64),
    #[command(description = "Delete a client (admin only)")]
    DeleteClient(i64),
    #[command(description = "List all clients (admin only)")]
    ListClients,
    #[command(description = "Add an admin (admin only)")]
    AddAdmin(i64),
}

/// Handle bot commands
async fn handle_commands(
    bot: Bot,
    msg: Message,
    cmd: BotCommands,
    services: Arc<ServiceFactory>,
) -> HandlerResult {
    let services = (*services).clone();

    let result = match cmd {
        BotCommands::Start => start::handle_start(bot, msg, services).await,
        BotCommands::Help => help::handle_help(bot, msg, services).await,
        BotCommands::Pending => {
            admin::handle_admin_action(&msg, &services, AdminAction::ListPending).await
        }
        BotCommands::Approve(client_id) => {
            admin::handle_admin_action(&msg, &services, AdminAction::Approve { client_id }).await
        }
        BotCommands::Reject(client_id) => {
            admin::handle_admin_action(&msg, &services, AdminAction::Reject { client_id }).await
        }
        BotCommands::Reset(client_id) => {
            admin::handle_admin_action(&msg, &services, AdminAction::Reset { client_id }).await
        }
        BotCommands::Assign(client_id, group_id) => {
            admin::handle_admin_action(
                &msg,
                &services,
                AdminAction::Assign {
                    client_id,
                    group_id,
                },
            )
            .await
        }
        BotCommands::Register => admin::handle_register_group(bot, &msg, &services).await,
        BotCommands::DeleteGroup(group_id) => {
            admin::handle_admin_action(&msg, &services, AdminAction::DeleteGroup { group_id }).await
        }
        BotCommands::DeleteClient(client_id) => {
            admin::handle_admin_action(&msg, &services, AdminAction::DeleteClient { client_id })
                .await
        }
        BotCommands::ListClients => {
            admin::handle_admin_action(&msg, &services, AdminAction::ListClients).await
        }
        BotCommands::AddAdmin(user_id) => {
            admin::handle_admin_action(&msg, &services, AdminAction::AddAdmin { user_id }).await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Error handling command");
        return Err(e.into());
    }

    Ok(())
}

/// Handle regular messages
async fn handle_messages(bot: Bot, msg: Message, services: Arc<ServiceFactory>) -> HandlerResult {
    let services = (*services).clone();

    if let Err(e) = messages::handle_message(bot, msg, services).await {
        error!(error = %e, "Error handling message");
        return Err(e.into());
    }

    Ok(())
}

/// Handle callback queries
async fn handle_callbacks(
    bot: Bot,
    query: teloxide::types::CallbackQuery,
    services: Arc<ServiceFactory>,
) -> HandlerResult {
    let services = (*services).clone();

    if let Err(e) = callbacks::handle_callback_query(bot, query, services).await {
        error!(error = %e, "Error handling callback query");
        return Err(e.into());
    }

    Ok(())
}

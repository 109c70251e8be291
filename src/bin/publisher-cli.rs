use clap::{Parser, Subcommand};
use wp_publisher::client::{AdminClient, AdminReply, PublishPayload, PublisherClient};
use wp_publisher::publish::params::DEFAULT_TITLE;

#[derive(Parser)]
#[command(name = "publisher-cli")]
#[command(about = "Publish WordPress posts through the publisher service", long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is unset.
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a post with a featured image
    Publish {
        /// URL of the publisher service
        worker_url: String,
        /// WordPress API key
        wordpress_api_key: String,
        /// WordPress site URL
        wordpress_url: String,
        /// URL of the featured image
        featured_image_url: String,
        /// HTML content for the post
        post_content: String,
        /// Post status (draft/publish)
        #[arg(long, default_value = "draft")]
        status: String,
        /// Post title
        #[arg(long, default_value = DEFAULT_TITLE)]
        title: String,
        /// WordPress user ID for post author
        #[arg(long)]
        author_id: Option<i64>,
        /// Category ID to assign to the post
        #[arg(long)]
        category_id: Option<i64>,
    },
    /// Check service status
    Status(AdminArgs),
    /// Manage the site API key
    Keys {
        #[command(flatten)]
        admin: AdminArgs,
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(clap::Args)]
struct AdminArgs {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "PUBLISHER_ADMIN_KEY")]
    key: String,
}

#[derive(Subcommand)]
enum KeyAction {
    /// Show the stored API key
    Show,
    /// Replace the API key with a new one
    Regenerate,
    /// Delete the API key option
    Uninstall,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    wp_publisher::observability::logging::init(&cli.log_level);

    match cli.command {
        Commands::Publish {
            worker_url,
            wordpress_api_key,
            wordpress_url,
            featured_image_url,
            post_content,
            status,
            title,
            author_id,
            category_id,
        } => {
            let mut payload = PublishPayload::new(
                wordpress_api_key,
                wordpress_url,
                featured_image_url,
                post_content,
            );
            payload.status = status;
            payload.title = title;
            payload.author_id = author_id;
            payload.category_id = category_id;

            let client = PublisherClient::new(&worker_url)?;
            match client.publish(&payload).await {
                Ok(reply) => {
                    println!("{}", reply.summary());
                    if !reply.is_success() {
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Status(admin) => {
            let client = AdminClient::new(&admin.url, &admin.key)?;
            print_reply(client.status().await?)?;
        }
        Commands::Keys { admin, action } => {
            let client = AdminClient::new(&admin.url, &admin.key)?;
            let reply = match action {
                KeyAction::Show => client.show_key().await?,
                KeyAction::Regenerate => client.regenerate_key().await?,
                KeyAction::Uninstall => client.uninstall().await?,
            };
            print_reply(reply)?;
        }
    }

    Ok(())
}

fn print_reply(reply: AdminReply) -> Result<(), Box<dyn std::error::Error>> {
    if !reply.is_success() {
        eprintln!("Error: Admin API returned status {}", reply.status);
        eprintln!("Response: {}", reply.body);
        std::process::exit(1);
    }

    if reply.body.is_null() {
        println!("OK ({})", reply.status);
    } else {
        println!("{}", serde_json::to_string_pretty(&reply.body)?);
    }
    Ok(())
}

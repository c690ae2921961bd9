//! Command Handlers
//!
//! Command-line surface. Every mutation goes through the optimistic layer,
//! so the driver sees the same notifications a UI would.

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};

use card_board::reorder::move_card;
use card_board::{
    Card, CardColor, CardDraft, CardGateway, CardId, CardSize, CardType, Notification, OptimisticCards,
};

#[derive(Debug, Parser)]
#[command(name = "card-board", about = "Personal card board backed by SQLite")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every card in display order
    List,
    /// Create a card
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        #[arg(long = "type", default_value = "text")]
        card_type: CardType,
        #[arg(long, default_value = "blue")]
        color: CardColor,
        #[arg(long, default_value = "1x1")]
        size: CardSize,
    },
    /// Edit fields of an existing card
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long = "type")]
        card_type: Option<CardType>,
        #[arg(long)]
        color: Option<CardColor>,
        #[arg(long)]
        size: Option<CardSize>,
    },
    /// Delete a card
    Delete { id: String },
    /// Move a card to the slot of another, as a drag would
    Move { id: String, over: String },
    /// Print the last lines of the log file
    Logs {
        #[arg(long, default_value_t = 20)]
        lines: usize,
    },
}

/// What a mutation left behind
#[derive(Debug)]
pub struct Report {
    pub notifications: Vec<Notification>,
    pub view: Vec<Card>,
}

/// Run one card command against an already loaded layer
pub async fn execute<G: CardGateway + 'static>(
    command: Command,
    layer: &OptimisticCards<G>,
) -> anyhow::Result<Report> {
    let mut notifications = layer.notifications();

    match command {
        Command::List | Command::Logs { .. } => {}
        Command::Add { title, content, card_type, color, size } => {
            let draft = CardDraft::validated(&title, &content, card_type, color, size)?;
            layer.add_card(draft).await;
        }
        Command::Update { id, title, content, card_type, color, size } => {
            let mut card = find_card(layer, &id)?;
            let mut edited = CardDraft::from(&card);
            if let Some(title) = title {
                edited.title = title;
            }
            if let Some(content) = content {
                edited.content = content;
            }
            let checked = CardDraft::validated(
                &edited.title,
                &edited.content,
                card_type.unwrap_or(card.card_type),
                color.unwrap_or(card.color),
                size.unwrap_or(card.size),
            )?;
            card.title = checked.title;
            card.content = checked.content;
            card.card_type = checked.card_type;
            card.color = checked.color;
            card.size = checked.size;
            layer.update_card(card).await;
        }
        Command::Delete { id } => {
            let card = find_card(layer, &id)?;
            layer.delete_card(card.id).await;
        }
        Command::Move { id, over } => {
            let order = move_card(&layer.current_view(), &CardId::from(id.as_str()), &CardId::from(over.as_str()))
                .ok_or_else(|| anyhow!("cannot move card {} over {}", id, over))?;
            layer.reorder_cards(order).await;
        }
    }

    let mut settled = Vec::new();
    while let Ok(notification) = notifications.try_recv() {
        settled.push(notification);
    }
    Ok(Report { notifications: settled, view: layer.current_view() })
}

fn find_card<G: CardGateway + 'static>(layer: &OptimisticCards<G>, id: &str) -> anyhow::Result<Card> {
    let id = CardId::from(id);
    match layer.current_view().into_iter().find(|c| c.id == id) {
        Some(card) => Ok(card),
        None => bail!("no card with id {}", id),
    }
}

/// Print notifications to stderr and the view as JSON to stdout
pub fn print_report(report: &Report) -> anyhow::Result<()> {
    for notification in &report.notifications {
        match &notification.detail {
            Some(detail) => eprintln!("[error] {} ({})", notification.message, detail),
            None => eprintln!("[{}] {}", notification.operation, notification.message),
        }
    }
    let json = serde_json::to_string_pretty(&report.view).context("failed to serialize cards")?;
    println!("{}", json);
    Ok(())
}

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm};
use enquiry_core::{ChatSession, Config, EnquiryClient, FaqAdmin, FaqId, Notice};
use url::form_urlencoded;

#[derive(Parser)]
#[command(name = "enquiry", version)]
#[command(about = "Chat with the college enquiry bot and manage its FAQs")]
pub struct Cli {
    /// Backend base URL (overrides config and ENQUIRY_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Open the chat with a canned question: admission, courses, fees, scholarships
    #[arg(short, long, conflicts_with = "link")]
    pub question: Option<String>,

    /// Open the chat from a link such as `/chat?question=fees`
    #[arg(long)]
    pub link: Option<String>,

    /// Enable the FAQ admin screen
    #[arg(long)]
    pub admin: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Send one message and print the reply
    Ask {
        message: String,
    },
    /// Manage stored FAQs
    Faq {
        #[command(subcommand)]
        action: FaqCommand,
    },
}

#[derive(Subcommand)]
pub enum FaqCommand {
    /// List stored FAQs
    List,
    /// Add a new FAQ
    Add {
        question: String,
        answer: String,
    },
    /// Replace the question and answer of an FAQ
    Update {
        id: String,
        question: String,
        answer: String,
    },
    /// Delete an FAQ
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl Cli {
    pub fn apply(&self, config: &mut Config) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
    }

    /// The deep link to open at start-up, if any
    pub fn deep_link(&self) -> Option<String> {
        match (&self.question, &self.link) {
            (Some(topic), _) => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair("question", topic)
                    .finish();
                Some(format!("?{query}"))
            }
            (None, Some(link)) => Some(link.clone()),
            (None, None) => None,
        }
    }
}

pub async fn ask(client: &EnquiryClient, message: &str) -> Result<()> {
    let mut session = ChatSession::new();
    session.input_mut().set(message);

    match session.exchange(client).await {
        Some(reply) => {
            println!("{} {}", "You:".bold().cyan(), message.trim());
            println!("{} {}", "AI:".bold().yellow(), reply.text);
        }
        None => println!("{}", "Nothing to send".yellow()),
    }

    Ok(())
}

pub async fn faq(client: &EnquiryClient, action: FaqCommand) -> Result<()> {
    let mut admin = FaqAdmin::new();

    match action {
        FaqCommand::List => {
            if admin.refresh(client).await {
                print_entries(&admin);
            }
        }
        FaqCommand::Add { question, answer } => {
            admin.create_form_mut().question.set(question);
            admin.create_form_mut().answer.set(answer);
            admin.create(client).await;
        }
        FaqCommand::Update {
            id,
            question,
            answer,
        } => {
            admin.begin_edit(FaqId::new(id), &question, &answer);
            admin.update(client).await;
        }
        FaqCommand::Delete { id, yes } => {
            let confirm = |prompt: &str| {
                yes || Confirm::with_theme(&ColorfulTheme::default())
                    .with_prompt(prompt)
                    .default(false)
                    .interact()
                    .unwrap_or_else(|err| {
                        tracing::warn!(error = %err, "confirmation prompt failed");
                        false
                    })
            };
            if !admin.delete_entry(FaqId::new(id), confirm, client).await && admin.notice().is_none() {
                println!("{}", "Cancelled".dimmed());
            }
        }
    }

    let mut failed = false;
    while let Some(notice) = admin.dismiss_notice() {
        match notice {
            Notice::Success(text) => println!("{}", text.green()),
            Notice::Error(text) => {
                eprintln!("{}", text.red());
                failed = true;
            }
        }
    }

    if failed {
        bail!("FAQ request failed");
    }
    Ok(())
}

fn print_entries(admin: &FaqAdmin) {
    if admin.entries().is_empty() {
        println!("{}", "No FAQs stored".yellow());
        return;
    }

    println!("\n{}", "📋 Stored FAQs".bold().blue());
    println!("{}", "=".repeat(40).dimmed());

    for entry in admin.entries() {
        println!(
            "\n{} {}",
            format!("#{}", entry.id).bold().yellow(),
            entry.question.bold()
        );
        println!("   {}", entry.answer);
    }
}

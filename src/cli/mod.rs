use crate::config::AppConfig;
use crate::database::sqlite::SqliteDatabase;
use crate::errors::Result;
use crate::services::appointments::AppointmentService;
use crate::services::notifications::NotificationService;
use colored::Colorize;
use std::sync::Arc;

pub struct CLI;

impl CLI {
    pub fn print_header() {
        println!("{}", "=".repeat(50).bright_blue());
        println!(
            "{}",
            "    Wallet Wealth - Appointment Admin    "
                .bright_yellow()
                .bold()
        );
        println!("{}", "=".repeat(50).bright_blue());
        println!();
    }

    pub fn print_error(message: &str) {
        println!("{} {}", "✗".red(), message.red());
    }

    pub fn print_help() {
        println!("\n{}", "Available Commands:".cyan().bold());
        println!("  appointments list");
        println!("    Print all appointment requests, newest first");
        println!();
        println!("  appointments stats");
        println!("    Print appointment counts by status");
        println!();
        println!("  help");
        println!("    Show this help message");
        println!();
        println!("Run with no arguments to start the HTTP API server.");
        println!();
    }
}

async fn build_service(config: &AppConfig) -> Result<AppointmentService> {
    let database = Arc::new(SqliteDatabase::new(&config.database_path).await?);
    let notifications = Arc::new(NotificationService::new(config.smtp.clone()));
    Ok(AppointmentService::new(
        database,
        notifications,
        config.admin_token.clone(),
    ))
}

pub async fn handle_appointments_command(args: &[String], config: &AppConfig) -> Result<()> {
    let service = build_service(config).await?;
    let token = Some(config.admin_token.as_str());

    match args.first().map(String::as_str) {
        Some("list") => {
            let appointments = service.list(token, None, Some(100), None).await?;
            if appointments.is_empty() {
                println!("{}", "No appointments found.".yellow());
                return Ok(());
            }
            println!("\n{}", "Appointment Requests:".cyan().bold());
            for (i, a) in appointments.iter().enumerate() {
                println!(
                    "{}. {} {}",
                    i + 1,
                    a.name.green().bold(),
                    format!("[{}]", a.status.as_str()).blue()
                );
                println!("   Service: {}", a.service_type);
                println!("   When: {} {}", a.preferred_date, a.preferred_time);
                println!("   Contact: {} | {}", a.email, a.phone);
                if let Some(message) = &a.message {
                    println!("   Message: {}", message);
                }
                println!("   Booked: {}", a.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
                println!("   Id: {}", a.id);
                println!();
            }
        }
        Some("stats") => {
            let stats = service.stats(token).await?;
            println!("\n{}", "Appointment Stats:".cyan().bold());
            println!("  Total:     {}", stats.total);
            println!("  Pending:   {}", stats.pending);
            println!("  Confirmed: {}", stats.confirmed);
            println!("  Completed: {}", stats.completed);
            println!("  Cancelled: {}", stats.cancelled);
            println!();
        }
        _ => {
            CLI::print_error("Unknown appointments command. Use 'list' or 'stats'.");
            CLI::print_help();
        }
    }

    Ok(())
}

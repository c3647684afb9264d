use std::io::{self, BufRead, Write};

use colored::Colorize;

use crate::adapters::http::key_directory::HttpKeyDirectory;
use crate::cli::KeysAction;
use crate::cli::commands::api_helpers;
use crate::cli::output;
use crate::config::app_config::AppConfig;
use crate::core::errors::{HsmError, Result};
use crate::core::models::filter::FilterToken;
use crate::core::models::key_record::{CreateKeyParams, KeyClass, KeyQuery, KeyRecord, KeyType};
use crate::core::services::key_list_controller::KeyListController;
use crate::core::services::list_state::{DetailPanel, ListState};
use crate::core::traits::key_directory::KeyDirectory;

/// Execute the `hsmctl keys` command.
pub fn execute(config: &AppConfig, action: &KeysAction) -> Result<()> {
    let client = api_helpers::authenticated_client(config)?;
    api_helpers::ensure_hsm_ready(&client)?;
    let directory = HttpKeyDirectory::new(&client);

    match action {
        KeysAction::List {
            filters,
            page,
            page_size,
            show,
        } => {
            let view = PageView::new(config, filters, *page, *page_size);
            execute_list(directory, &view, *show)
        }
        KeysAction::Show {
            key_class,
            key_type,
            label,
            id,
        } => execute_show(&directory, key_class, key_type, label.clone(), id.clone()),
        KeysAction::Create {
            label,
            key_class,
            key_type,
            size,
        } => execute_create(directory, label, key_class, key_type, *size, config.keys.page_size),
        KeysAction::Delete {
            filters,
            page,
            page_size,
            rows,
            all_on_page,
            yes,
        } => {
            let view = PageView::new(config, filters, *page, *page_size);
            execute_delete(directory, &view, rows, *all_on_page, *yes)
        }
    }
}

/// Parse `--filter` arguments, rejecting unsupported combinations up front.
pub fn parse_filters(raw: &[String]) -> Result<Vec<FilterToken>> {
    raw.iter().map(|s| s.parse()).collect()
}

/// Which page of which listing the user asked for.
struct PageView<'a> {
    filters: &'a [String],
    page: usize,
    default_page_size: usize,
    page_size: Option<usize>,
}

impl<'a> PageView<'a> {
    fn new(
        config: &AppConfig,
        filters: &'a [String],
        page: usize,
        page_size: Option<usize>,
    ) -> Self {
        Self {
            filters,
            page,
            default_page_size: config.keys.page_size,
            page_size,
        }
    }
}

/// Build a controller showing the requested page of the (filtered) key list.
fn load_page<D: KeyDirectory>(directory: D, view: &PageView<'_>) -> Result<KeyListController<D>> {
    if view.page == 0 || view.page_size == Some(0) {
        return Err(HsmError::ValidationError {
            detail: "--page and --page-size must be at least 1".into(),
        });
    }
    let tokens = parse_filters(view.filters)?;
    let mut controller = KeyListController::new(directory, view.default_page_size);

    let sp = output::spinner("Loading keys...");
    let result = controller.apply_filter(tokens);
    output::clear_spinner(sp);
    result?;

    if let Some(size) = view.page_size {
        controller.change_page_size(size);
    }
    controller.change_page(view.page);
    Ok(controller)
}

fn execute_list<D: KeyDirectory>(
    directory: D,
    view: &PageView<'_>,
    show: Option<usize>,
) -> Result<()> {
    let mut controller = load_page(directory, view)?;
    print_table(controller.state());

    if let Some(row) = show {
        let record = visible_row(controller.state(), row)?;
        let sp = output::spinner("Loading key details...");
        // Failures are rendered by the panel; keep the error for the exit code.
        let result = controller.view_detail(&record);
        output::clear_spinner(sp);
        print_detail(&record, controller.state().detail());
        controller.close_detail();
        result?;
    }
    Ok(())
}

fn visible_row(state: &ListState, row: usize) -> Result<KeyRecord> {
    row.checked_sub(1)
        .and_then(|i| state.visible_keys().get(i))
        .cloned()
        .ok_or_else(|| HsmError::ValidationError {
            detail: format!(
                "Row {row} is not on this page ({} row(s) shown)",
                state.visible_keys().len()
            ),
        })
}

fn execute_show(
    directory: &impl KeyDirectory,
    key_class: &str,
    key_type: &str,
    label: Option<String>,
    key_id: Option<String>,
) -> Result<()> {
    let query = KeyQuery {
        key_class: key_class.parse()?,
        key_type: key_type.parse()?,
        label,
        key_id,
    };
    let sp = output::spinner("Loading key details...");
    let result = directory.find(&query);
    output::clear_spinner(sp);
    let record = result?;
    print_key_information(&record);
    Ok(())
}

fn execute_create<D: KeyDirectory>(
    directory: D,
    label: &str,
    key_class: &str,
    key_type: &str,
    size: Option<u32>,
    page_size: usize,
) -> Result<()> {
    if label.trim().is_empty() {
        return Err(HsmError::ValidationError {
            detail: "Label is required".into(),
        });
    }
    let key_class: KeyClass = key_class.parse()?;
    let key_type: KeyType = key_type.parse()?;
    let params = CreateKeyParams::new(label, key_class, key_type).with_size(size);

    let mut controller = KeyListController::new(directory, page_size);
    let sp = output::spinner(&format!("Creating {key_type} key '{label}'..."));
    let result = controller.create_key(&params);
    output::clear_spinner(sp);
    let message = result?;

    output::success(&message);
    match controller.state().error() {
        Some(err) => output::warning(&format!("Key list not reloaded: {err}")),
        None => println!("  {} key(s) now visible", controller.state().keys().len()),
    }
    Ok(())
}

fn execute_delete<D: KeyDirectory>(
    directory: D,
    view: &PageView<'_>,
    rows: &[usize],
    all_on_page: bool,
    yes: bool,
) -> Result<()> {
    let mut controller = load_page(directory, view)?;

    if all_on_page {
        controller.select_page();
    } else {
        for &row in rows {
            visible_row(controller.state(), row)?;
        }
        controller.select_rows(rows);
    }

    let targets: Vec<KeyRecord> = controller
        .state()
        .selected_keys()
        .into_iter()
        .cloned()
        .collect();
    if targets.is_empty() {
        output::warning("No keys selected (use --rows or --all-on-page)");
        return Ok(());
    }

    output::header(&format!("Delete {} key(s)", targets.len()));
    for key in &targets {
        println!("  • {key}");
    }

    if !yes && !confirm("Are you sure you want to delete these key(s)?")? {
        controller.clear_selection();
        output::warning("Aborted, nothing deleted");
        return Ok(());
    }

    let sp = output::spinner("Deleting keys...");
    let result = controller.delete_keys(&targets);
    output::clear_spinner(sp);
    let report = result?;
    if let Some(err) = controller.state().error().filter(|_| report.is_complete()) {
        output::warning(&format!("Key list not reloaded: {err}"));
    }
    let report = report.into_result()?;

    output::success(&format!(
        "Successfully deleted {} key(s)",
        report.deleted_count
    ));
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("\n  {question} [y/N]: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Render the visible page as a table with row numbers.
fn print_table(state: &ListState) {
    let filter = if state.tokens().is_empty() {
        String::new()
    } else {
        let tokens: Vec<String> = state.tokens().iter().map(|t| t.to_string()).collect();
        format!(" matching {}", tokens.join(" AND "))
    };
    output::header(&format!("Keys ({}){filter}", state.keys().len()));
    if let Some(message) = state.error() {
        output::warning(message);
    }

    let visible = state.visible_keys();
    if visible.is_empty() {
        if state.keys().is_empty() {
            output::warning("No keys found");
        } else {
            output::warning(&format!(
                "Page {} is empty ({} page(s) available)",
                state.current_page(),
                state.total_pages()
            ));
        }
        return;
    }

    println!(
        "\n  {:>3}  {:<24} {:<12} {:<5} {}",
        "#".dimmed(),
        "Label".bold(),
        "Class".bold(),
        "Type".bold(),
        "Key ID".bold()
    );
    for (i, key) in visible.iter().enumerate() {
        println!(
            "  {:>3}  {:<24} {:<12} {:<5} {}",
            (i + 1).to_string().dimmed(),
            key.label.as_deref().unwrap_or("-"),
            key.key_class.as_str(),
            key.key_type.as_str(),
            key.key_id.as_deref().unwrap_or("-")
        );
    }

    if state.total_pages() > 1 {
        println!(
            "\n  Page {} of {} ({} per page)",
            state.current_page(),
            state.total_pages(),
            state.page_size()
        );
    }
}

fn print_detail(record: &KeyRecord, panel: &DetailPanel) {
    output::header(&format!(
        "Key Details: {}",
        record.label.as_deref().unwrap_or("No key selected")
    ));
    match panel {
        DetailPanel::Closed => println!("  No key details available"),
        DetailPanel::Loading { .. } => println!("  Loading key details..."),
        DetailPanel::Loaded { record } => print_key_information(record),
        DetailPanel::Failed { message, .. } => output::warning(message),
    }
}

fn print_key_information(record: &KeyRecord) {
    let yes_no = |v: bool| if v { "Yes".green() } else { "No".dimmed() };
    println!("  {:<12} {}", "Label", record.label.as_deref().unwrap_or("-"));
    println!("  {:<12} {}", "Class", record.key_class);
    println!("  {:<12} {}", "Type", record.key_type);
    println!("  {:<12} {}", "Key ID", record.key_id.as_deref().unwrap_or("-"));
    for (name, value) in record.attributes() {
        println!("  {:<12} {}", name, yes_no(value));
    }
}

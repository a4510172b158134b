// Entry point and high-level console flow.
//
// The menu mirrors the dashboard's pages:
// - Options [1]-[4] open one table each: load on first visit, edit in the
//   grid, upload a replacement file, save back to the canonical CSV.
// - Option [5] computes the aggregate charts and the utilization forecast.
// - Option [6] shows the embedded MOM dashboard report verbatim.
mod aggregate;
mod forecast;
mod loader;
mod normalize;
mod output;
mod session;
mod table;
mod types;
mod ui;
mod util;
mod xlsx;

use loader::LoadOutcome;
use session::{Session, TableKind};
use std::io::{self, Write};
use types::Chart;
use ui::{ConsolePresenter, Presenter};
use util::format_int;

// Fixed-name static report displayed verbatim by the MOM Dashboard page.
const MOM_DASHBOARD_FILE: &str = "mom_dashboard.html";

const SUMMARY_FILE: &str = "summary.json";

/// Read a single line of input after printing the common "Enter choice:" prompt.
///
/// The prompt is reused for the main menu and the per-page menus.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_path(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Surface the diagnostics of a load: missing files are informational,
/// parse failures are warnings, clean loads report their row count.
fn report_load<P: Presenter>(presenter: &mut P, path: &str, outcome: &LoadOutcome) {
    if outcome.missing_file {
        presenter.info(&format!("{} not found; starting with an empty table.", path));
        return;
    }
    for warning in &outcome.warnings {
        presenter.warn(warning);
    }
    if outcome.warnings.is_empty() {
        presenter.info(&format!(
            "{} rows loaded from {}.",
            format_int(outcome.rows_loaded() as i64),
            path
        ));
    }
}

/// One table page: view/edit the grid, upload a replacement, save.
fn page_table<P: Presenter>(session: &mut Session, presenter: &mut P, kind: TableKind) {
    if let Some(outcome) = session.ensure_loaded(kind) {
        report_load(presenter, session.path(kind), &outcome);
    }
    loop {
        println!("\n{}", kind.title());
        println!("[1] View / edit");
        println!("[2] Upload file (CSV or .xlsx)");
        println!("[3] Save");
        println!("[4] Back\n");
        match read_choice().as_str() {
            "1" => {
                let edited = presenter.edit_table(session.table(kind));
                // Derived columns are recomputed on every replace.
                session.replace(kind, edited);
            }
            "2" => {
                let path = read_path("Path to upload: ");
                if path.is_empty() {
                    continue;
                }
                let outcome = session.import(kind, &path);
                if outcome.missing_file {
                    presenter.warn(&format!("{} does not exist.", path));
                } else {
                    report_load(presenter, &path, &outcome);
                }
            }
            "3" => match session.save(kind) {
                Ok(()) => presenter.info(&format!("Saved to {}.", session.path(kind))),
                Err(e) => presenter.warn(&format!("Could not save: {}", e)),
            },
            _ => break,
        }
    }
}

/// Pick one month out of those present in a table's Month column.
fn pick_month<P: Presenter>(
    presenter: &mut P,
    months: Vec<types::Month>,
) -> Option<types::Month> {
    if months.is_empty() {
        return None;
    }
    let labels: Vec<String> = months.iter().map(|m| m.label()).collect();
    presenter.pick("Select month:", &labels).map(|i| months[i])
}

/// The charts page. Every mode recomputes from the current in-memory
/// tables; a mode whose required columns are missing renders nothing.
fn page_charts<P: Presenter>(session: &mut Session, presenter: &mut P) {
    for kind in [TableKind::Activities, TableKind::MeHours] {
        if let Some(outcome) = session.ensure_loaded(kind) {
            report_load(presenter, session.path(kind), &outcome);
        }
    }
    let modes = [
        "Status distribution",
        "Activities per month by status",
        "Resource hours for a month",
        "Combined activity vs ME hours",
        "ME hours by resource for a month",
        "Utilization forecast",
        "Export summary JSON",
    ];
    let options: Vec<String> = modes.iter().map(|m| m.to_string()).collect();
    while let Some(choice) = presenter.pick("Select chart:", &options) {
        let activities = session.table(TableKind::Activities);
        let me_hours = session.table(TableKind::MeHours);
        match choice {
            0 => {
                if let Some(chart) = aggregate::status_distribution(activities) {
                    presenter.render_chart(&Chart::Counts(chart));
                }
            }
            1 => {
                if let Some(chart) = aggregate::status_by_month(activities) {
                    presenter.render_chart(&Chart::Series(chart));
                }
            }
            2 => {
                if let Some(month) = pick_month(presenter, aggregate::months_of(activities)) {
                    if let Some(chart) = aggregate::resource_hours_for_month(activities, month) {
                        presenter.render_chart(&Chart::Series(chart));
                    }
                }
            }
            3 => {
                if let Some(chart) = aggregate::combined_hours_by_month(activities, me_hours) {
                    presenter.render_chart(&Chart::Series(chart));
                }
            }
            4 => {
                if let Some(month) = pick_month(presenter, aggregate::months_of(me_hours)) {
                    if let Some(chart) = aggregate::me_hours_by_resource(me_hours, month) {
                        presenter.render_chart(&Chart::Bars(chart));
                    }
                }
            }
            5 => {
                let samples = forecast::utilization_samples(activities, me_hours);
                if let Some(chart) = forecast::utilization_forecast(&samples) {
                    presenter.render_chart(&Chart::Series(chart));
                }
            }
            _ => {
                let stats = aggregate::summary(
                    session.table(TableKind::Activities),
                    session.table(TableKind::Automations),
                    session.table(TableKind::Servers),
                    session.table(TableKind::MeHours),
                );
                match output::write_json(SUMMARY_FILE, &stats) {
                    Ok(()) => {
                        presenter.info(&format!("Summary written to {}.", SUMMARY_FILE));
                        output::preview_rows(&[stats], 1);
                    }
                    Err(e) => presenter.warn(&format!("Could not write summary: {}", e)),
                }
            }
        }
    }
}

/// The MOM Dashboard page is pure pass-through: show the fixed-name report
/// file verbatim. A missing file is a visible message, not a crash.
fn page_report<P: Presenter>(presenter: &mut P) {
    match std::fs::read_to_string(MOM_DASHBOARD_FILE) {
        Ok(contents) => println!("{}", contents),
        Err(_) => presenter.warn(&format!(
            "{} not found in the working directory.",
            MOM_DASHBOARD_FILE
        )),
    }
}

fn main() {
    let mut session = Session::new();
    let mut presenter = ConsolePresenter;
    loop {
        println!("\nActivity & Automation Tracker");
        println!("[1] Upcoming Activities");
        println!("[2] Automation Details");
        println!("[3] Server List");
        println!("[4] ME Hours");
        println!("[5] Charts & Forecast");
        println!("[6] MOM Dashboard");
        println!("[0] Exit\n");
        match read_choice().as_str() {
            "1" => page_table(&mut session, &mut presenter, TableKind::Activities),
            "2" => page_table(&mut session, &mut presenter, TableKind::Automations),
            "3" => page_table(&mut session, &mut presenter, TableKind::Servers),
            "4" => page_table(&mut session, &mut presenter, TableKind::MeHours),
            "5" => page_charts(&mut session, &mut presenter),
            "6" => page_report(&mut presenter),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-6.\n"),
        }
    }
}

/// Display-text helpers for the panel's titles and date labels.
///
/// The rendering layer owns layout and styling, but the wording of layer
/// titles and degraded-state messages is data this crate produces, so the
/// same failure reads identically across panel revisions.

use chrono::NaiveDate;

use crate::model::MatchKind;
use crate::variables::find_variable;

/// Formats a date the way the panel displays it: `dd/mm/yyyy`.
pub fn format_date_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Title for the forecast classification layer, annotated with the
/// resolution outcome: missing files and fallback substitutions are
/// spelled out so the operator can tell substituted data from current
/// data.
pub fn class_layer_title(
    var_key: &str,
    date: Option<NaiveDate>,
    match_kind: MatchKind,
) -> String {
    let base = match find_variable(var_key) {
        Some(var) if var.dated => match date {
            Some(d) => format!("Camada previsão: {} – {}", var.label, format_date_br(d)),
            None => format!("Camada previsão: {}", var.label),
        },
        Some(var) => format!("Camada previsão: {}", var.label),
        None => "Camada previsão".to_string(),
    };

    match match_kind {
        MatchKind::Exact => base,
        MatchKind::DateFallback | MatchKind::MostRecent => {
            format!("{} (dados mais recentes disponíveis)", base)
        }
        MatchKind::NotFound => format!("{} (arquivo não encontrado)", base),
    }
}

/// Title for the facility point layer: "Unidades – UPA".
pub fn facility_layer_title(layer_key: &str) -> String {
    format!("Unidades – {}", layer_key.to_uppercase())
}

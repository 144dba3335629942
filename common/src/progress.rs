//! Proyección de un snapshot a lo que se muestra: título y barras por fase.
//!
//! Todo acá es puro; no toca contadores ni decide nada sobre el polling.

use std::fmt;

use crate::snapshot::{StageStatus, StatusSnapshot, TaskStatus};

/// Porcentaje de una fase, truncado a centésimas (nunca redondea hacia arriba).
///
/// `total == 0` significa que la fase no empezó: devuelve 0, no 100.
pub fn percent_complete(stage: &StageStatus) -> f64 {
    if stage.total == 0 {
        return 0.0;
    }
    if stage.pending == 0 {
        return 100.0;
    }
    let pct = 100.0 * stage.done() as f64 / stage.total as f64;
    (pct * 100.0).floor() / 100.0
}

/// "PROCESSING" -> "Processing...", "COMPLETE" -> "Complete".
pub fn title_for(status: TaskStatus) -> String {
    let raw = status.as_str();
    let mut title = String::with_capacity(raw.len() + 3);
    let mut chars = raw.chars();
    if let Some(first) = chars.next() {
        title.extend(first.to_uppercase());
        title.push_str(&chars.as_str().to_lowercase());
    }
    if status.is_ongoing() {
        title.push_str("...");
    }
    title
}

/// Mensaje visible cuando falla la observación. El prefijo deja claro que lo
/// que falló es obtener el estado, no la tarea.
pub fn observe_error_message(err: &impl fmt::Display) -> String {
    format!("Failed to get status: {}", err)
}

/// Cómo se muestra una fase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StageLabel {
    #[default]
    Default,
    Custom(String),
    Hidden,
}

impl StageLabel {
    fn resolve<'a>(&'a self, default: &'a str) -> Option<&'a str> {
        match self {
            StageLabel::Default => Some(default),
            StageLabel::Custom(name) => Some(name),
            StageLabel::Hidden => None,
        }
    }
}

/// Configuración de visibilidad de las tres fases.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageDisplay {
    pub map: StageLabel,
    pub reduce: StageLabel,
    pub summarize: StageLabel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Indicator {
    /// Sin porcentaje (tarea en PENDING).
    Indeterminate,
    Determinate { name: String, percent: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub title: String,
    pub indicators: Vec<Indicator>,
}

/// Arma la vista de un snapshot:
/// - PENDING: título + un indicador indeterminado
/// - PROCESSING: título + una barra por fase visible
/// - COMPLETE / FAILED: sólo el título
pub fn project(snapshot: &StatusSnapshot, display: &StageDisplay) -> ProgressView {
    let title = title_for(snapshot.status);

    let indicators = match snapshot.status {
        TaskStatus::Pending => vec![Indicator::Indeterminate],
        TaskStatus::Processing => [
            (display.map.resolve("Map"), &snapshot.map),
            (display.reduce.resolve("Reduce"), &snapshot.reduce),
            (display.summarize.resolve("Summarize"), &snapshot.summarize),
        ]
        .into_iter()
        .filter_map(|(label, stage)| {
            label.map(|name| Indicator::Determinate {
                name: name.to_string(),
                percent: percent_complete(stage),
            })
        })
        .collect(),
        TaskStatus::Complete | TaskStatus::Failed => Vec::new(),
    };

    ProgressView { title, indicators }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MapReduceStage;

    fn snapshot(status: TaskStatus) -> StatusSnapshot {
        StatusSnapshot {
            task_id: "t".to_string(),
            deployment_id: "d".to_string(),
            status,
            stage: (status == TaskStatus::Processing).then_some(MapReduceStage::Reduce),
            stage_percent_complete: 0.0,
            size: 0,
            map: StageStatus::new(0, 0, 5),
            reduce: StageStatus::new(2, 0, 3),
            summarize: StageStatus::default(),
        }
    }

    /* ============
       PORCENTAJES
       ============ */

    #[test]
    fn fase_sin_items_es_cero() {
        for pending in [0, 3] {
            let stage = StageStatus::new(pending, 0, 0);
            assert_eq!(percent_complete(&stage), 0.0);
        }
    }

    #[test]
    fn fase_sin_pendientes_es_cien() {
        for total in [1, 7, 1_000_000] {
            assert_eq!(percent_complete(&StageStatus::new(0, 0, total)), 100.0);
        }
    }

    #[test]
    fn trunca_a_centesimas() {
        assert_eq!(percent_complete(&StageStatus::new(2, 0, 3)), 33.33);
        assert_eq!(percent_complete(&StageStatus::new(1, 0, 3)), 66.66);
        assert_eq!(percent_complete(&StageStatus::new(1, 0, 8)), 87.5);
        assert_eq!(percent_complete(&StageStatus::new(1, 0, 10_000_000)), 99.99);
    }

    #[test]
    fn monotono_y_acotado_al_bajar_pending() {
        for total in [1u64, 3, 7, 10, 99, 1000] {
            let mut prev = 0.0;
            for pending in (0..=total).rev() {
                let pct = percent_complete(&StageStatus::new(pending, 0, total));
                assert!((0.0..=100.0).contains(&pct), "{pct} fuera de rango");
                assert!(pct >= prev, "{pct} < {prev} (total={total})");
                prev = pct;
            }
        }
    }

    /* ============
       TÍTULOS
       ============ */

    #[test]
    fn titulos_con_y_sin_puntos() {
        assert_eq!(title_for(TaskStatus::Pending), "Pending...");
        assert_eq!(title_for(TaskStatus::Processing), "Processing...");
        assert_eq!(title_for(TaskStatus::Complete), "Complete");
        assert_eq!(title_for(TaskStatus::Failed), "Failed");
    }

    #[test]
    fn mensaje_de_error_lleva_prefijo() {
        assert_eq!(
            observe_error_message(&"Unexpected response code: 500"),
            "Failed to get status: Unexpected response code: 500"
        );
    }

    /* ============
       PROYECCIÓN
       ============ */

    #[test]
    fn pending_es_indeterminado() {
        let view = project(&snapshot(TaskStatus::Pending), &StageDisplay::default());
        assert_eq!(view.title, "Pending...");
        assert_eq!(view.indicators, vec![Indicator::Indeterminate]);
    }

    #[test]
    fn processing_con_etiquetas_por_defecto() {
        let view = project(&snapshot(TaskStatus::Processing), &StageDisplay::default());
        assert_eq!(
            view.indicators,
            vec![
                Indicator::Determinate { name: "Map".into(), percent: 100.0 },
                Indicator::Determinate { name: "Reduce".into(), percent: 33.33 },
                Indicator::Determinate { name: "Summarize".into(), percent: 0.0 },
            ]
        );
    }

    #[test]
    fn fases_ocultas_y_renombradas() {
        let display = StageDisplay {
            map: StageLabel::Custom("Leyendo facturas".into()),
            reduce: StageLabel::Hidden,
            summarize: StageLabel::Hidden,
        };
        let snap = snapshot(TaskStatus::Processing);
        let view = project(&snap, &display);

        assert_eq!(
            view.indicators,
            vec![Indicator::Determinate { name: "Leyendo facturas".into(), percent: 100.0 }]
        );
        // ocultar no toca los contadores
        assert_eq!(snap.reduce, StageStatus::new(2, 0, 3));
    }

    #[test]
    fn terminales_solo_titulo() {
        for status in [TaskStatus::Complete, TaskStatus::Failed] {
            let mut snap = snapshot(status);
            snap.stage = None;
            let view = project(&snap, &StageDisplay::default());
            assert!(view.indicators.is_empty());
        }
    }
}

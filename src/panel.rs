use std::fmt;

use _model::Store;

use crate::map::escape;

/// The results list shown next to the map.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Panel {
    pub open: bool,
    pub rows: Vec<PanelRow>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PanelRow {
    pub place: String,
    pub distance_text: Option<String>,
}

/// Sorts `stores` nearest first and lists them. Stores the distance service
/// couldn't reach keep their relative order at the end.
pub fn render_panel(stores: &mut [Store]) -> Panel {
    if stores.is_empty() {
        return Panel::default();
    }

    stores.sort_by_key(|x| {
        let d = x.properties.distance_value;
        (d.is_none(), d)
    });
    Panel {
        open: true,
        rows: stores.iter().map(store_to_panel_row).collect(),
    }
}

fn store_to_panel_row(store: &Store) -> PanelRow {
    PanelRow {
        place: store.properties.business_name.clone(),
        distance_text: store.properties.distance_text.clone(),
    }
}

impl Panel {
    pub fn to_html(&self) -> String {
        self.rows
            .iter()
            .map(|x| {
                format!(
                    "<div><p class=\"place\">{}</p><p class=\"distanceText\">{}</p></div>\n",
                    escape(&x.place),
                    escape(x.distance_text.as_deref().unwrap_or_default())
                )
            })
            .collect()
    }
}

impl fmt::Display for Panel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.open {
            return writeln!(f, "No drop-off locations nearby.");
        }
        let width = self.rows.iter().map(|x| x.place.chars().count()).max().unwrap_or(0);
        for row in &self.rows {
            writeln!(
                f,
                "{:<width$}  {}",
                row.place,
                row.distance_text.as_deref().unwrap_or("unknown")
            )?;
        }
        Ok(())
    }
}

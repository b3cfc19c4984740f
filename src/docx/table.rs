use super::document::{DocumentXml, RunStyle};

/// Writes today's and cumulative quantities into the appendix row whose name
/// column contains `row_name`. Column layout is inferred from the header row:
/// column 1 holds the item name, the third-from-last column the daily
/// quantity, the second-from-last the cumulative quantity. A value of `""`
/// or `"-"` leaves the cell as it is.
///
/// Returns `false` when the table or a matching row does not exist.
pub fn update_quantity_row(
    doc: &mut DocumentXml,
    table_index: usize,
    row_name: &str,
    today: &str,
    total: &str,
) -> bool {
    let tables = doc.tables();
    let Some(&table) = tables.get(table_index) else {
        return false;
    };

    let rows = doc.table_rows(table);
    let Some(&header) = rows.first() else {
        return false;
    };
    let columns = doc.row_cells(header).len();
    if columns < 4 {
        return false;
    }

    let name_col = 1;
    let today_col = columns - 3;
    let total_col = columns - 2;
    let style = RunStyle::table_cell();

    for row in rows {
        let cells = doc.row_cells(row);
        if cells.len() <= total_col {
            continue;
        }
        if !doc.text_within(cells[name_col]).contains(row_name) {
            continue;
        }

        // Later cell first so the earlier span stays valid.
        if !total.is_empty() && total != "-" {
            doc.replace_cell_content(cells[total_col], total, &style);
        }
        if !today.is_empty() && today != "-" {
            doc.replace_cell_content(cells[today_col], today, &style);
        }
        return true;
    }

    false
}

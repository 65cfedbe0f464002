//! Report column headers and how they map onto [`UsageRow`] fields.

use serde_json::{Map, Value};

use super::cells::{decimal, integer, text};
use crate::types::UsageRow;

/// A report column: the stored field name and the header platforms send.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub field: &'static str,
    pub header: &'static str,
}

const fn column(field: &'static str, header: &'static str) -> Column {
    Column { field, header }
}

pub const PERIOD: Column = column("period", "Период использования");
pub const PLATFORM: Column = column("platform", "Площадка");
pub const RIGHT_TYPE: Column = column("right_type", "Тип прав");
pub const TERRITORY: Column = column("territory", "Территория");
pub const CONTENT_TYPE: Column = column("content_type", "Тип контента");
pub const USAGE_TYPE: Column = column("usage_type", "Вид использования");
pub const PERFORMER: Column = column("performer_name", "Исполнитель");
pub const TRACK_TITLE: Column = column("track_title", "Название трека");
pub const ALBUM_TITLE: Column = column("album_title", "Название альбома");
pub const AUTHOR_WORDS: Column = column("author_words_name", "Автор слов");
pub const AUTHOR_MUSIC: Column = column("author_music_name", "Автор музыки");
pub const LICENSOR_AUTHOR_SHARE: Column = column(
    "licensor_share_author_percent",
    "Доля авторских прав Лицензиара",
);
pub const LICENSOR_NEIGHBORING_SHARE: Column = column(
    "licensor_share_neighboring_percent",
    "Доля смежных прав Лицензиара",
);
pub const ISRC: Column = column("isrc", "ISRC");
pub const UPC: Column = column("upc", "UPC");
pub const COPYRIGHT: Column = column("copyright", "Копирайт");
pub const QUANTITY: Column = column("quantity", "Количество");
pub const TOTAL_ROYALTY_AUTHOR: Column = column(
    "total_royalty_author",
    "Сумма денежных средств, полученных ЛИЦЕНЗИАТОМ за авторские права",
);
pub const TOTAL_ROYALTY_NEIGHBORING: Column = column(
    "total_royalty_neighboring",
    "Сумма денежных средств, полученных ЛИЦЕНЗИАТОМ за смежные права",
);
pub const LICENSOR_AUTHOR_MONETIZATION: Column = column(
    "licensor_share_author_licensor_percent",
    "Доля монетизации Лицензиара авторских прав",
);
pub const LICENSOR_NEIGHBORING_MONETIZATION: Column = column(
    "licensor_share_neighboring_licensor_percent",
    "Доля монетизации Лицензиара смежных прав",
);
pub const ROYALTY_AUTHOR: Column = column(
    "calculated_royalty_author",
    "Вознаграждение ЛИЦЕНЗИАРА за авторские права",
);
pub const ROYALTY_NEIGHBORING: Column = column(
    "calculated_royalty_neighboring",
    "Вознаграждение ЛИЦЕНЗИАРА за смежные права",
);
pub const TOTAL_ROYALTY: Column = column("calculated_total_royalty", "Итого вознаграждение ЛИЦЕНЗИАРА");

/// Looks a cell up by its report header, then by its field name.
fn cell<'a>(record: &'a Map<String, Value>, column: Column) -> Option<&'a Value> {
    record
        .get(column.header)
        .or_else(|| record.get(column.field))
}

/// Maps one report record onto a usage row. Unknown columns are ignored.
#[must_use]
pub fn usage_row(record: &Map<String, Value>) -> UsageRow {
    UsageRow {
        period: text(cell(record, PERIOD)),
        platform: text(cell(record, PLATFORM)),
        right_type: text(cell(record, RIGHT_TYPE)),
        territory: text(cell(record, TERRITORY)),
        content_type: text(cell(record, CONTENT_TYPE)),
        usage_type: text(cell(record, USAGE_TYPE)),
        performer_name: text(cell(record, PERFORMER)),
        track_title: text(cell(record, TRACK_TITLE)),
        album_title: text(cell(record, ALBUM_TITLE)),
        author_words_name: text(cell(record, AUTHOR_WORDS)),
        author_music_name: text(cell(record, AUTHOR_MUSIC)),
        licensor_share_author_percent: decimal(cell(record, LICENSOR_AUTHOR_SHARE)),
        licensor_share_neighboring_percent: decimal(cell(record, LICENSOR_NEIGHBORING_SHARE)),
        isrc: text(cell(record, ISRC)),
        upc: text(cell(record, UPC)),
        copyright: text(cell(record, COPYRIGHT)),
        quantity: integer(cell(record, QUANTITY)),
        total_royalty_author: decimal(cell(record, TOTAL_ROYALTY_AUTHOR)),
        total_royalty_neighboring: decimal(cell(record, TOTAL_ROYALTY_NEIGHBORING)),
        licensor_share_author_licensor_percent: decimal(cell(record, LICENSOR_AUTHOR_MONETIZATION)),
        licensor_share_neighboring_licensor_percent: decimal(cell(
            record,
            LICENSOR_NEIGHBORING_MONETIZATION,
        )),
        calculated_royalty_author: decimal(cell(record, ROYALTY_AUTHOR)),
        calculated_royalty_neighboring: decimal(cell(record, ROYALTY_NEIGHBORING)),
        calculated_total_royalty: decimal(cell(record, TOTAL_ROYALTY)),
    }
}

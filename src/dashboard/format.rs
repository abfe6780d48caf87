use time::{Date, Month};

/// First letter of the first two space-separated words, uppercased.
pub fn initials(name: &str) -> String {
    name.split(' ')
        .take(2)
        .filter_map(|word| word.chars().next())
        .collect::<String>()
        .to_uppercase()
}

/// es-AR short date, e.g. `15 mar 1985`.
pub fn format_date(date: Date) -> String {
    let month = match date.month() {
        Month::January => "ene",
        Month::February => "feb",
        Month::March => "mar",
        Month::April => "abr",
        Month::May => "may",
        Month::June => "jun",
        Month::July => "jul",
        Month::August => "ago",
        Month::September => "sept",
        Month::October => "oct",
        Month::November => "nov",
        Month::December => "dic",
    };
    format!("{} {} {}", date.day(), month, date.year())
}

//! Book display formatting
//!
//! Formats books for terminal output in table and detail views.

use crate::models::Book;

/// Format a list of books as a table
pub fn format_book_list(books: &[Book], currency_symbol: &str) -> String {
    if books.is_empty() {
        return "No books found.\n".to_string();
    }

    // Calculate column widths
    let id_width = books
        .iter()
        .map(|b| b.id.to_string().len())
        .max()
        .unwrap_or(2)
        .max(2);

    let title_width = books
        .iter()
        .map(|b| b.title.chars().count())
        .max()
        .unwrap_or(5)
        .clamp(5, 40);

    let author_width = books
        .iter()
        .map(|b| b.author.chars().count())
        .max()
        .unwrap_or(6)
        .clamp(6, 30);

    let mut output = String::new();
    output.push_str(&format!(
        "{:>id_width$}  {:<title_width$}  {:<author_width$}  {:>4}  {:>12}\n",
        "ID",
        "Title",
        "Author",
        "Year",
        "Price",
        id_width = id_width,
        title_width = title_width,
        author_width = author_width,
    ));

    output.push_str(&format!(
        "{:->id_width$}  {:-<title_width$}  {:-<author_width$}  {:->4}  {:->12}\n",
        "",
        "",
        "",
        "",
        "",
        id_width = id_width,
        title_width = title_width,
        author_width = author_width,
    ));

    for book in books {
        output.push_str(&format!(
            "{:>id_width$}  {:<title_width$}  {:<author_width$}  {:>4}  {:>12}\n",
            book.id,
            truncate(&book.title, title_width),
            truncate(&book.author, author_width),
            book.year,
            book.price.format_with_symbol(currency_symbol),
            id_width = id_width,
            title_width = title_width,
            author_width = author_width,
        ));
    }

    output.push('\n');
    output.push_str(&format!("Total: {} book(s)\n", books.len()));
    output
}

/// Format a single book's details
pub fn format_book_details(book: &Book, currency_symbol: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("Book: {}\n", book.title));
    output.push_str(&format!("  ID:     {}\n", book.id));
    output.push_str(&format!("  Author: {}\n", book.author));
    output.push_str(&format!("  Year:   {}\n", book.year));
    output.push_str(&format!(
        "  Price:  {}\n",
        book.price.format_with_symbol(currency_symbol)
    ));

    output
}

/// Shorten `text` to `width` characters, marking the cut with "..."
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

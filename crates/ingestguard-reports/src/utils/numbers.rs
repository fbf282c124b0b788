pub fn format_numbers(n: usize) -> String {
    match n {
        n if n >= 1_000_000_000 => format!("{:0.1}B", n as f64 / 1_000_000_000.0),
        n if n >= 1_000_000 => format!("{:0.1}M", n as f64 / 1_000_000.0),
        n if n >= 10_000 => format!("{:0.1}K", n as f64 / 1_000.0),
        _ => n.to_string(),
    }
}

pub fn format_percent(p: f64) -> String {
    if p > 0.0 && p < 0.01 {
        "<0.01%".to_string()
    } else {
        format!("{:.2}%", p)
    }
}

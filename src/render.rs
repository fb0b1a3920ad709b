use colored::Colorize;
use crowdwork_collab::SessionView;
use crowdwork_core::SongRequest;

/// How many of the latest chat messages are printed with the session
const SHOWN_MESSAGES: usize = 5;

/// Renders a session snapshot for the terminal
pub fn render(view: &SessionView) -> String {
    let mut lines = vec![];

    let session = view.session_id.as_deref().unwrap_or("-");
    let host = view
        .profile
        .as_ref()
        .map(|dj| format!(" with {}", dj.name.bold()))
        .unwrap_or_default();
    let connection = if view.connected {
        "live".green()
    } else {
        "offline".yellow()
    };

    lines.push(format!("Session {}{} ({})", session.bold(), host, connection));

    match &view.partitions.now_playing {
        Some(request) => lines.push(format!("Now playing: {}", request_line(view, request))),
        None => lines.push("Nothing is playing".dimmed().to_string()),
    }

    if view.partitions.active.is_empty() {
        lines.push("The queue is empty".dimmed().to_string());
    }

    for request in &view.partitions.active {
        lines.push(format!("  {}", request_line(view, request)));
    }

    lines.push(
        format!(
            "{} played, {} declined",
            view.partitions.completed.len(),
            view.partitions.declined.len()
        )
        .dimmed()
        .to_string(),
    );

    let skipped = view.messages.len().saturating_sub(SHOWN_MESSAGES);

    for message in &view.messages[skipped..] {
        lines.push(format!(
            "[{}] {}: {}",
            message.created_at.format("%H:%M"),
            message.sender.as_deref().unwrap_or("guest").cyan(),
            message.message
        ));
    }

    let slots = [
        ("requests", &view.errors.requests),
        ("messages", &view.errors.messages),
        ("profile", &view.errors.profile),
    ];

    for (resource, error) in slots {
        if let Some(error) = error {
            lines.push(format!("Could not load {}: {}", resource, error).red().to_string());
        }
    }

    lines.join("\n")
}

fn request_line(view: &SessionView, request: &SongRequest) -> String {
    let mut line = format!(
        "{} {} ({} likes)",
        request.id.dimmed(),
        request.song,
        request.likes
    );

    if let Some(error) = view.like_errors.get(&request.id) {
        line.push_str(&format!("  {}", error.red()));
    }

    line
}

#[cfg(test)]
mod tests {
    use crowdwork_core::{derive_partitions, RequestStatus};

    use super::*;

    #[test]
    fn renders_partitions_and_like_errors() {
        let requests = vec![
            SongRequest::new("a", "Robyn - Dancing On My Own", RequestStatus::Playing),
            SongRequest::new("b", "Justice - D.A.N.C.E.", RequestStatus::Queued).with_likes(4),
        ];

        let mut view = SessionView {
            session_id: Some("s1".to_string()),
            partitions: derive_partitions(&requests),
            ..Default::default()
        };
        view.like_errors
            .insert("b".to_string(), "You already liked this request".to_string());
        view.errors.messages = Some("Session not found".to_string());

        let text = render(&view);

        assert!(text.contains("Robyn - Dancing On My Own"));
        assert!(text.contains("Justice - D.A.N.C.E. (4 likes)"));
        assert!(text.contains("You already liked this request"));
        assert!(text.contains("Could not load messages: Session not found"));
    }
}

use crate::model::{Envelope, ServerList, StatusFilter};

/// Client-side status filter.
///
/// `All` echoes the current envelope back; a concrete status keeps only the
/// matching servers, in their current order.
pub fn filter_envelope(status: StatusFilter, current: &Envelope<ServerList>) -> Envelope<ServerList> {
    if status == StatusFilter::All {
        let mut env = current.clone();
        env.message = format!("Servers filtered by {} status", status.as_wire());
        return env;
    }

    let servers: Vec<_> = current
        .data
        .servers
        .iter()
        .filter(|s| status.matches(s.status))
        .cloned()
        .collect();
    let message = if servers.is_empty() {
        format!("No servers of {} found", status.as_wire())
    } else {
        format!("Servers filtered by {} status", status.label())
    };

    let mut env = current.with_data(ServerList { servers });
    env.message = message;
    env
}

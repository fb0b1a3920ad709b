use crate::{RequestStatus, SongRequest};

/// The song requests of a session, split by status
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitions {
    pub now_playing: Option<SongRequest>,
    /// Queued requests, plus any extra `playing` requests that lost the tie-break
    pub active: Vec<SongRequest>,
    pub completed: Vec<SongRequest>,
    pub declined: Vec<SongRequest>,
}

impl Partitions {
    pub fn len(&self) -> usize {
        self.now_playing.iter().count()
            + self.active.len()
            + self.completed.len()
            + self.declined.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits the full request set into the four view partitions.
///
/// Order within each partition follows the input order. If more than one request
/// reports `playing`, the one with the highest revision is now playing and the rest
/// show up in `active`. That only happens when the backend sends conflicting updates.
pub fn derive_partitions(requests: &[SongRequest]) -> Partitions {
    let now_playing_id = requests
        .iter()
        .filter(|r| r.status == RequestStatus::Playing)
        // max_by_key keeps the last of equal revisions, i.e. the later one in the list
        .max_by_key(|r| r.revision)
        .map(|r| r.id.clone());

    let mut partitions = Partitions::default();

    for request in requests {
        match request.status {
            RequestStatus::Playing if Some(&request.id) == now_playing_id.as_ref() => {
                partitions.now_playing = Some(request.clone())
            }
            RequestStatus::Playing | RequestStatus::Queued => {
                partitions.active.push(request.clone())
            }
            RequestStatus::Completed => partitions.completed.push(request.clone()),
            RequestStatus::Declined => partitions.declined.push(request.clone()),
        }
    }

    partitions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str, status: RequestStatus, revision: u64) -> SongRequest {
        let mut request = SongRequest::new(id, format!("Song {}", id), status);
        request.revision = revision;
        request
    }

    #[test]
    fn splits_by_status() {
        let requests = vec![
            request("a", RequestStatus::Queued, 1),
            request("b", RequestStatus::Playing, 2),
            request("c", RequestStatus::Completed, 3),
            request("d", RequestStatus::Declined, 4),
            request("e", RequestStatus::Queued, 5),
        ];

        let partitions = derive_partitions(&requests);

        assert_eq!(partitions.now_playing.map(|r| r.id), Some("b".to_string()));
        assert_eq!(
            partitions.active.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "e"]
        );
        assert_eq!(partitions.completed.len(), 1);
        assert_eq!(partitions.declined.len(), 1);
    }

    #[test]
    fn picks_most_recent_of_several_playing() {
        let requests = vec![
            request("old", RequestStatus::Playing, 7),
            request("new", RequestStatus::Playing, 9),
            request("older", RequestStatus::Playing, 2),
        ];

        let partitions = derive_partitions(&requests);

        assert_eq!(partitions.now_playing.map(|r| r.id), Some("new".to_string()));
        assert_eq!(
            partitions.active.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
            vec!["old", "older"]
        );
    }

    #[test]
    fn partitions_are_disjoint_and_complete() {
        let statuses = [
            RequestStatus::Queued,
            RequestStatus::Playing,
            RequestStatus::Completed,
            RequestStatus::Declined,
        ];

        let requests: Vec<_> = (0..40)
            .map(|i| request(&i.to_string(), statuses[i % 4], (i * 7 % 13) as u64))
            .collect();

        let partitions = derive_partitions(&requests);

        assert_eq!(partitions.len(), requests.len());
        assert!(partitions.now_playing.is_some());
        assert_eq!(partitions.active.len(), 10 + 9);
    }

    #[test]
    fn empty_input_gives_empty_view() {
        assert!(derive_partitions(&[]).is_empty());
    }
}

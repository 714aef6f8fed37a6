use crate::{QueueClient, QueueRef, TransferError};

/// Lists every queue and looks up its tags, one queue at a time.
///
/// Called once at startup to build the selection list. Any failure is
/// returned as is; there is no partial listing.
pub async fn discover_queues<C>(client: &C) -> Result<Vec<QueueRef>, TransferError>
where
    C: QueueClient + ?Sized,
{
    let urls = client.list_queues().await?;
    log::debug!("found {} queues", urls.len());

    let mut queues = Vec::with_capacity(urls.len());
    for url in urls {
        let tags = client.describe_tags(&url).await?;
        queues.push(QueueRef::with_tags(url, tags));
    }

    Ok(queues)
}

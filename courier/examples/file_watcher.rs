/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! A simulated file watcher feeding an indexing pipeline.
//!
//! The watcher only holds a bus clone. Running it inside a tracked activity
//! still lets the caller wait until every file it reported has been indexed,
//! thumbnailed and announced.

use std::time::Duration;

use rand::Rng;
use tracing_subscriber::EnvFilter;

use courier::prelude::*;

// --- Messages ---

/// A new file appeared in the watched directory.
#[courier_message]
struct FileAdded(String);

/// Announced once a file has been indexed.
#[courier_message]
struct FileIndexed(String);

/// Sent to the thumbnail service for image files.
#[courier_message]
struct ThumbnailRequested(String);

// --- Handlers ---

/// Indexes every added file and asks for thumbnails of images.
struct Indexer;

#[async_trait]
impl Handler<FileAdded> for Indexer {
    async fn handle(&self, context: MessageContext<FileAdded>) -> HandlerResult {
        let file_name = &context.message().0;
        tokio::time::sleep(Duration::from_millis(20)).await;
        if file_name.ends_with(".png") {
            context.send(ThumbnailRequested(file_name.clone()))?;
        }
        context.publish(FileIndexed(file_name.clone()))?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "indexer"
    }
}

// --- Watcher ---

struct Watcher {
    bus: MessageBus,
}

impl Watcher {
    async fn scan(&self, files: &[&str]) -> Result<(), BusError> {
        for file in files {
            let delay = rand::rng().random_range(10..60);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.bus.send(FileAdded((*file).to_string()))?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .init();

    let bus = CourierApp::builder()
        .handle::<FileAdded, _>(Indexer)
        .handle_fn::<ThumbnailRequested, _, _>("thumbnailer", |context| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            println!("thumbnail ready for {}", context.message().0);
            Ok(())
        })
        .subscribe_fn::<FileIndexed, _, _>("search", |context| async move {
            println!("search index updated with {}", context.message().0);
            Ok(())
        })
        .subscribe_fn::<FileIndexed, _, _>("audit", |context| async move {
            println!("audit log: {} indexed", context.message().0);
            Ok(())
        })
        .build();

    let watcher = Watcher { bus: bus.clone() };
    let report = bus
        .track_activity()
        .timeout(Duration::from_secs(5))
        .execute_and_wait(|_context| async move {
            watcher.scan(&["notes.txt", "cat.png", "budget.csv"]).await?;
            Ok(())
        })
        .await?;

    println!(
        "settled in {:?}: {} sent, {} published, deepest cascade {}",
        report.elapsed(),
        report.sent().count(),
        report.published().count(),
        report.max_depth().unwrap_or_default()
    );
    for entry in report.envelopes() {
        println!(
            "  {} {} {} (parent: {})",
            entry.envelope_id(),
            entry.intent(),
            entry.type_name(),
            entry
                .parent_id()
                .map_or_else(|| "none".to_string(), |id| id.to_string())
        );
    }
    Ok(())
}

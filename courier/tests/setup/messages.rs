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
#![allow(unused)]

use courier::prelude::*;

#[courier_message]
pub struct FileAdded(pub String);

#[courier_message]
pub struct FileAddedViaPublish(pub String);

#[courier_message]
pub struct FileIndexed {
    pub file_name: String,
    pub indexer: &'static str,
}

#[courier_message]
pub struct ThumbnailRequested(pub String);

/// Re-sends itself until `remaining` reaches zero.
#[courier_message]
pub struct Cascade {
    pub remaining: usize,
}

#[courier_message]
pub struct SlowJob {
    pub millis: u64,
}

#[courier_message]
pub struct Hang;

#[courier_message]
pub struct Explode;

#[courier_message]
pub struct Unrouted;

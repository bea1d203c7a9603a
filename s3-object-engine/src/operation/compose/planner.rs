/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::cmp;
use std::ops::RangeInclusive;

use crate::config::SizeLimits;
use crate::error::{self, Error};
use crate::operation::compose::ComposeSource;
use crate::types::ObjectStat;

/// One planned copy: a byte range of one source destined for one part number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedPart {
    pub(crate) source_index: usize,
    pub(crate) range: RangeInclusive<u64>,
    pub(crate) part_number: u64,
}

impl PlannedPart {
    pub(crate) fn len(&self) -> u64 {
        self.range.end() - self.range.start() + 1
    }
}

/// The full copy plan for a composition. Part numbers are contiguous from 1,
/// assigned in source-list order.
#[derive(Debug)]
pub(crate) struct PartPlan {
    pub(crate) parts: Vec<PlannedPart>,
    pub(crate) total_size: u64,
}

/// Resolve the byte range a source contributes, validating any explicit range
/// against the stat'd size. `None` means the source is empty and contributes
/// no parts.
fn resolve_copy_range(
    source_index: usize,
    source: &ComposeSource,
    stat: &ObjectStat,
) -> Result<Option<RangeInclusive<u64>>, Error> {
    match &source.range {
        Some(range) => {
            let (start, end) = (*range.start(), *range.end());
            if start > end || end >= stat.size() {
                return Err(error::invalid_input(format!(
                    "source {source_index} ({}/{}): byte range {start}-{end} is outside the object (size {})",
                    source.bucket,
                    source.key,
                    stat.size(),
                )));
            }
            Ok(Some(start..=end))
        }
        None if stat.size() == 0 => Ok(None),
        None => Ok(Some(0..=stat.size() - 1)),
    }
}

/// Split a copy range into maximal chunks of at most `part_size` bytes.
fn split_ranges(range: RangeInclusive<u64>, part_size: u64) -> Vec<RangeInclusive<u64>> {
    let end = *range.end();
    let mut pos = *range.start();
    let mut remaining = end - pos + 1;
    let mut ranges = Vec::new();

    while remaining > 0 {
        let end_inclusive = cmp::min(pos + part_size - 1, end);
        let chunk_size = end_inclusive - pos + 1;
        ranges.push(pos..=end_inclusive);
        remaining -= chunk_size;
        pos += chunk_size;
    }

    ranges
}

/// Build the part plan for the given sources and validate it against the
/// configured limits. Runs before anything is sent to the service; every
/// violation is reported as invalid input.
pub(crate) fn plan(
    sources: &[ComposeSource],
    stats: &[ObjectStat],
    limits: &SizeLimits,
) -> Result<PartPlan, Error> {
    debug_assert_eq!(sources.len(), stats.len());

    let mut parts: Vec<PlannedPart> = Vec::new();
    let mut total_size: u64 = 0;

    for (source_index, (source, stat)) in sources.iter().zip(stats).enumerate() {
        let Some(range) = resolve_copy_range(source_index, source, stat)? else {
            continue;
        };
        total_size += range.end() - range.start() + 1;
        if total_size > limits.max_object_size() {
            return Err(error::invalid_input(format!(
                "cannot compose an object larger than {} bytes",
                limits.max_object_size(),
            )));
        }

        for chunk in split_ranges(range, limits.max_part_size()) {
            let part_number = parts.len() as u64 + 1;
            parts.push(PlannedPart {
                source_index,
                range: chunk,
                part_number,
            });
        }
        if parts.len() as u64 > limits.max_part_count() {
            return Err(error::invalid_input(format!(
                "composition requires more than {} parts",
                limits.max_part_count(),
            )));
        }
    }

    // Only the final part of the whole composition may undershoot the
    // minimum part size.
    if let Some((_, rest)) = parts.split_last() {
        if let Some(small) = rest.iter().find(|p| p.len() < limits.min_part_size()) {
            return Err(error::invalid_input(format!(
                "source {} yields a {} byte part (part {}), smaller than the minimum part size {}",
                small.source_index,
                small.len(),
                small.part_number,
                limits.min_part_size(),
            )));
        }
    }

    Ok(PartPlan { parts, total_size })
}

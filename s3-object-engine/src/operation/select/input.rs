/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::io;

use quick_xml::events::{BytesDecl, Event};
use quick_xml::Writer;

use crate::xml::write_text_element;

/// How the select expression is interpreted. SQL is the only expression type
/// the protocol defines today.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub enum ExpressionType {
    /// An SQL expression
    #[default]
    Sql,
}

impl ExpressionType {
    fn as_str(&self) -> &'static str {
        match self {
            ExpressionType::Sql => "SQL",
        }
    }
}

/// Compression applied to the stored object, which the service decompresses
/// before evaluating the expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CompressionType {
    /// Object is not compressed
    #[default]
    None,
    /// GZIP compressed
    Gzip,
    /// BZIP2 compressed
    Bzip2,
}

impl CompressionType {
    fn as_str(&self) -> &'static str {
        match self {
            CompressionType::None => "NONE",
            CompressionType::Gzip => "GZIP",
            CompressionType::Bzip2 => "BZIP2",
        }
    }
}

/// How the first line of a CSV object is treated.
#[derive(Debug, Clone, Default)]
pub enum FileHeaderInfo {
    /// First line is not a header
    None,
    /// First line is a header usable in column references
    #[default]
    Use,
    /// First line is a header but must be ignored
    Ignore,
}

impl FileHeaderInfo {
    fn as_str(&self) -> &'static str {
        match self {
            FileHeaderInfo::None => "NONE",
            FileHeaderInfo::Use => "USE",
            FileHeaderInfo::Ignore => "IGNORE",
        }
    }
}

/// Structure of a JSON input object.
#[derive(Debug, Clone, Default)]
pub enum JsonType {
    /// A single JSON document
    Document,
    /// Newline-delimited JSON records
    #[default]
    Lines,
}

impl JsonType {
    fn as_str(&self) -> &'static str {
        match self {
            JsonType::Document => "DOCUMENT",
            JsonType::Lines => "LINES",
        }
    }
}

/// Format of the object the expression runs against.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum InputSerialization {
    /// CSV input
    Csv {
        /// Header handling for the first line
        file_header_info: FileHeaderInfo,
    },
    /// JSON input
    Json {
        /// Document or line-delimited structure
        json_type: JsonType,
    },
    /// Parquet input
    Parquet,
}

impl Default for InputSerialization {
    fn default() -> Self {
        InputSerialization::Csv {
            file_header_info: FileHeaderInfo::default(),
        }
    }
}

/// Format the query results are streamed back in.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub enum OutputSerialization {
    /// CSV records
    #[default]
    Csv,
    /// JSON records
    Json,
}

/// Input for a select-content query.
#[derive(Debug, Clone)]
pub struct SelectInput {
    pub(crate) bucket: String,
    pub(crate) key: String,
    pub(crate) expression: String,
    pub(crate) expression_type: ExpressionType,
    pub(crate) compression: CompressionType,
    pub(crate) input_serialization: InputSerialization,
    pub(crate) output_serialization: OutputSerialization,
    pub(crate) request_progress: bool,
}

impl SelectInput {
    /// Query `expression` against the given object. Defaults to CSV input
    /// with a usable header line, CSV output, no compression, and no
    /// progress events.
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            expression: expression.into(),
            expression_type: ExpressionType::default(),
            compression: CompressionType::default(),
            input_serialization: InputSerialization::default(),
            output_serialization: OutputSerialization::default(),
            request_progress: false,
        }
    }

    /// Set the input object's compression.
    pub fn compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    /// Set the input serialization format.
    pub fn input_serialization(mut self, input: InputSerialization) -> Self {
        self.input_serialization = input;
        self
    }

    /// Set the output serialization format.
    pub fn output_serialization(mut self, output: OutputSerialization) -> Self {
        self.output_serialization = output;
        self
    }

    /// Ask the service to interleave progress events into the response.
    pub fn request_progress(mut self, enabled: bool) -> Self {
        self.request_progress = enabled;
        self
    }

    /// Serialize the request document sent as the POST body.
    pub(crate) fn to_xml(&self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(256);
        let mut writer = Writer::new(&mut buf);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer
            .create_element("SelectObjectContentRequest")
            .write_inner_content(|w| {
                write_text_element(w, "Expression", &self.expression)?;
                write_text_element(w, "ExpressionType", self.expression_type.as_str())?;

                w.create_element("InputSerialization").write_inner_content(|w| {
                    if self.compression != CompressionType::None {
                        write_text_element(w, "CompressionType", self.compression.as_str())?;
                    }
                    match &self.input_serialization {
                        InputSerialization::Csv { file_header_info } => {
                            w.create_element("CSV").write_inner_content(|w| {
                                write_text_element(
                                    w,
                                    "FileHeaderInfo",
                                    file_header_info.as_str(),
                                )
                            })?;
                        }
                        InputSerialization::Json { json_type } => {
                            w.create_element("JSON").write_inner_content(|w| {
                                write_text_element(w, "Type", json_type.as_str())
                            })?;
                        }
                        InputSerialization::Parquet => {
                            w.create_element("Parquet").write_empty()?;
                        }
                    }
                    Ok(())
                })?;

                w.create_element("OutputSerialization").write_inner_content(|w| {
                    match &self.output_serialization {
                        OutputSerialization::Csv => w.create_element("CSV").write_empty()?,
                        OutputSerialization::Json => w.create_element("JSON").write_empty()?,
                    };
                    Ok(())
                })?;

                if self.request_progress {
                    w.create_element("RequestProgress").write_inner_content(|w| {
                        write_text_element(w, "Enabled", "true")
                    })?;
                }
                Ok(())
            })?;

        Ok(buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn request_document_shape() {
        let input = SelectInput::new("bucket", "key", "select * from s3object")
            .compression(CompressionType::Gzip)
            .input_serialization(InputSerialization::Json {
                json_type: JsonType::Lines,
            })
            .output_serialization(OutputSerialization::Json)
            .request_progress(true);

        let body = String::from_utf8(input.to_xml().unwrap()).unwrap();
        assert!(body.contains("<Expression>select * from s3object</Expression>"));
        assert!(body.contains("<ExpressionType>SQL</ExpressionType>"));
        assert!(body.contains("<CompressionType>GZIP</CompressionType>"));
        assert!(body.contains("<JSON><Type>LINES</Type></JSON>"));
        assert!(body.contains("<OutputSerialization><JSON/></OutputSerialization>"));
        assert!(body.contains("<RequestProgress><Enabled>true</Enabled></RequestProgress>"));
    }

    #[test]
    fn defaults_are_csv_with_header() {
        let body =
            String::from_utf8(SelectInput::new("b", "k", "q").to_xml().unwrap()).unwrap();
        assert!(body.contains("<CSV><FileHeaderInfo>USE</FileHeaderInfo></CSV>"));
        assert!(!body.contains("CompressionType"));
        assert!(!body.contains("RequestProgress"));
    }
}

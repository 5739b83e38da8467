//! Parsing of `ebicsResponse` / `ebicsKeyManagementResponse` documents into
//! one flat envelope record the engine consumes.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use ebics_core::return_code::{OrderStatus, ReturnCode};
use ebics_core::types::TransactionPhase;
use ebics_core::EbicsError;
use ebics_xml::names::*;
use ebics_xml::Element;

#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    /// `header/mutable/ReturnCode`.
    pub technical_code: ReturnCode,
    pub report_text: String,
    /// `body/ReturnCode`, absent on some key management responses.
    pub business_code: Option<ReturnCode>,
    pub order_id: Option<String>,
    pub transaction_id: Option<String>,
    pub num_segments: Option<u32>,
    pub phase: Option<TransactionPhase>,
    pub segment_number: Option<u32>,
    pub last_segment: bool,
    /// RSA-wrapped AES session key from `DataEncryptionInfo`.
    pub transaction_key: Option<Vec<u8>>,
    /// `OrderData` content, still Base64.
    pub order_data: Option<String>,
}

impl ResponseEnvelope {
    pub fn parse(doc: &Element) -> Result<Self, EbicsError> {
        if doc.local_name() != EBICS_RESPONSE && doc.local_name() != EBICS_KEY_MANAGEMENT_RESPONSE {
            return Err(EbicsError::MalformedResponse(format!(
                "unexpected document element <{}>",
                doc.name
            )));
        }

        let header = doc
            .first_child(HEADER)
            .ok_or_else(|| EbicsError::MalformedResponse("response has no header".into()))?;
        let mutable = header
            .first_child(MUTABLE)
            .ok_or_else(|| EbicsError::MalformedResponse("response has no mutable header".into()))?;
        let static_header = header
            .first_child(STATIC)
            .ok_or_else(|| EbicsError::MalformedResponse("response has no static header".into()))?;

        let technical_code = ReturnCode::parse(
            &mutable
                .first_child(RETURN_CODE)
                .map(Element::text_content)
                .ok_or_else(|| EbicsError::MalformedResponse("response has no return code".into()))?,
        )?;
        let report_text = mutable
            .first_child(REPORT_TEXT)
            .map(Element::text_content)
            .unwrap_or_default();

        let phase = match mutable.first_child(TRANSACTION_PHASE) {
            Some(el) => {
                let text = el.text_content();
                Some(TransactionPhase::parse(text.trim()).ok_or_else(|| {
                    EbicsError::MalformedResponse(format!("unknown phase {text:?}"))
                })?)
            }
            None => None,
        };

        let segment_el = mutable.first_child(SEGMENT_NUMBER);
        let segment_number = match segment_el {
            Some(el) => Some(parse_u32(&el.text_content())?),
            None => None,
        };
        let last_segment = segment_el
            .and_then(|el| el.attribute(ATTR_LAST_SEGMENT))
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let num_segments = match static_header.first_child(NUM_SEGMENTS) {
            Some(el) => Some(parse_u32(&el.text_content())?),
            None => None,
        };

        let body = doc.first_child(BODY);
        let business_code = match body.and_then(|b| b.first_child(RETURN_CODE)) {
            Some(el) => Some(ReturnCode::parse(&el.text_content())?),
            None => None,
        };
        let data_transfer = body.and_then(|b| b.first_child(DATA_TRANSFER));
        let transaction_key = match data_transfer
            .and_then(|dt| dt.first_child(DATA_ENCRYPTION_INFO))
            .and_then(|dei| dei.first_child(TRANSACTION_KEY))
        {
            Some(el) => Some(decode_b64(&el.text_content())?),
            None => None,
        };
        let order_data = data_transfer
            .and_then(|dt| dt.first_child(ORDER_DATA))
            .map(Element::text_content);

        Ok(Self {
            technical_code,
            report_text,
            business_code,
            order_id: mutable.first_child(ORDER_ID).map(|el| el.text_content().trim().to_string()),
            transaction_id: static_header
                .first_child(TRANSACTION_ID)
                .map(|el| el.text_content().trim().to_string())
                .filter(|id| !id.is_empty()),
            num_segments,
            phase,
            segment_number,
            last_segment,
            transaction_key,
            order_data,
        })
    }

    pub fn status(&self) -> OrderStatus {
        OrderStatus {
            technical_code: self.technical_code,
            business_code: self.business_code,
            report_text: self.report_text.clone(),
            order_id: self.order_id.clone(),
        }
    }
}

fn parse_u32(text: &str) -> Result<u32, EbicsError> {
    text.trim()
        .parse::<u32>()
        .map_err(|_| EbicsError::MalformedResponse(format!("bad number {text:?}")))
}

/// Base64 with embedded whitespace tolerated, as banks line-wrap order data.
pub(crate) fn decode_b64(text: &str) -> Result<Vec<u8>, EbicsError> {
    let compact: String = text.split_whitespace().collect();
    BASE64
        .decode(compact)
        .map_err(|e| EbicsError::MalformedResponse(format!("base64: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_download_init_response() {
        let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
<ebicsResponse xmlns="urn:org:ebics:H004" Version="H004" Revision="1">
  <header authenticate="true">
    <static>
      <TransactionID>A1B2C3D4E5F60718</TransactionID>
      <NumSegments>2</NumSegments>
    </static>
    <mutable>
      <TransactionPhase>Initialisation</TransactionPhase>
      <SegmentNumber lastSegment="false">1</SegmentNumber>
      <ReturnCode>000000</ReturnCode>
      <ReportText>[EBICS_OK] OK</ReportText>
    </mutable>
  </header>
  <body>
    <DataTransfer>
      <DataEncryptionInfo>
        <TransactionKey>AAEC</TransactionKey>
      </DataEncryptionInfo>
      <OrderData>c2VnbWVudA==</OrderData>
    </DataTransfer>
    <ReturnCode authenticate="true">000000</ReturnCode>
  </body>
</ebicsResponse>"#;
        let envelope = ResponseEnvelope::parse(&Element::parse(xml).unwrap()).unwrap();

        assert!(envelope.technical_code.is_ok());
        assert_eq!(envelope.business_code, Some(ReturnCode::OK));
        assert_eq!(envelope.transaction_id.as_deref(), Some("A1B2C3D4E5F60718"));
        assert_eq!(envelope.num_segments, Some(2));
        assert_eq!(envelope.segment_number, Some(1));
        assert!(!envelope.last_segment);
        assert_eq!(envelope.phase, Some(TransactionPhase::Initialisation));
        assert_eq!(envelope.transaction_key, Some(vec![0x00, 0x01, 0x02]));
        assert_eq!(envelope.order_data.as_deref(), Some("c2VnbWVudA=="));
        assert_eq!(envelope.report_text, "[EBICS_OK] OK");
    }

    #[test]
    fn parses_a_key_management_error() {
        let xml = br#"<ebicsKeyManagementResponse xmlns="urn:org:ebics:H004" Version="H004" Revision="1">
  <header authenticate="true">
    <static/>
    <mutable>
      <ReturnCode>091003</ReturnCode>
      <ReportText>[EBICS_USER_UNKNOWN] unknown user</ReportText>
    </mutable>
  </header>
  <body/>
</ebicsKeyManagementResponse>"#;
        let envelope = ResponseEnvelope::parse(&Element::parse(xml).unwrap()).unwrap();
        assert_eq!(envelope.technical_code, ReturnCode::USER_UNKNOWN);
        assert!(envelope.transaction_id.is_none());
        assert!(envelope.order_data.is_none());
    }

    #[test]
    fn rejects_foreign_documents() {
        let doc = Element::parse(b"<somethingElse/>").unwrap();
        assert!(ResponseEnvelope::parse(&doc).is_err());
    }
}

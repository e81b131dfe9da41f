#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const NUMERIC_FIELDS: [&str; 10] = [
    "manufacturerId",
    "productType",
    "productId",
    "basicClass",
    "genericClass",
    "specificClass",
    "appVersion",
    "appSubVersion",
    "protoVersion",
    "protoSubVersion",
];

/// A small schema accepting the device descriptions built by [`DeviceXml`]
pub const DEVICE_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:complexType name="localized">
    <xs:sequence>
      <xs:element name="lang" maxOccurs="unbounded">
        <xs:complexType>
          <xs:simpleContent>
            <xs:extension base="xs:string">
              <xs:anyAttribute namespace="http://www.w3.org/XML/1998/namespace" processContents="skip"/>
            </xs:extension>
          </xs:simpleContent>
        </xs:complexType>
      </xs:element>
    </xs:sequence>
  </xs:complexType>
  <xs:complexType name="valued">
    <xs:attribute name="value" type="xs:string" use="required"/>
  </xs:complexType>
  <xs:element name="ZWaveDevice">
    <xs:complexType>
      <xs:sequence>
        <xs:element name="deviceDescription">
          <xs:complexType>
            <xs:sequence>
              <xs:element name="description" type="localized"/>
              <xs:element name="brandName" type="xs:string"/>
              <xs:element name="productName" type="xs:string"/>
            </xs:sequence>
          </xs:complexType>
        </xs:element>
        <xs:element name="deviceData">
          <xs:complexType>
            <xs:sequence>
              <xs:element name="manufacturerId" type="valued"/>
              <xs:element name="productType" type="valued"/>
              <xs:element name="productId" type="valued"/>
              <xs:element name="basicClass" type="valued"/>
              <xs:element name="genericClass" type="valued"/>
              <xs:element name="specificClass" type="valued"/>
              <xs:element name="appVersion" type="valued"/>
              <xs:element name="appSubVersion" type="valued"/>
              <xs:element name="protoVersion" type="valued"/>
              <xs:element name="protoSubVersion" type="valued"/>
            </xs:sequence>
          </xs:complexType>
        </xs:element>
        <xs:element name="resourceLinks" minOccurs="0">
          <xs:complexType>
            <xs:sequence>
              <xs:element name="deviceImage">
                <xs:complexType>
                  <xs:attribute name="url" type="xs:string"/>
                </xs:complexType>
              </xs:element>
            </xs:sequence>
          </xs:complexType>
        </xs:element>
      </xs:sequence>
    </xs:complexType>
  </xs:element>
</xs:schema>"#;

/// Builder for device description documents
pub struct DeviceXml {
    pub manufacturer_id: String,
    pub brand_name: String,
    pub product_name: String,
    pub image_url: Option<String>,
    pub descriptions: Vec<(String, String)>,
}

impl DeviceXml {
    pub fn new(manufacturer_id: &str, brand_name: &str) -> Self {
        Self {
            manufacturer_id: manufacturer_id.to_string(),
            brand_name: brand_name.to_string(),
            product_name: "Wall Plug".to_string(),
            image_url: Some("http://example.com/plug.png".to_string()),
            descriptions: vec![
                ("en".to_string(), "Wall plug".to_string()),
                ("de".to_string(), "Zwischenstecker".to_string()),
                ("ru".to_string(), "Розетка".to_string()),
            ],
        }
    }

    pub fn without_language(mut self, code: &str) -> Self {
        self.descriptions.retain(|(lang, _)| lang != code);
        self
    }

    pub fn render(&self) -> String {
        let descriptions: String = self
            .descriptions
            .iter()
            .map(|(lang, text)| format!("\n        <lang xml:lang=\"{}\">{}</lang>", lang, text))
            .collect();

        let data: String = NUMERIC_FIELDS
            .iter()
            .map(|field| {
                let value = if *field == "manufacturerId" {
                    self.manufacturer_id.as_str()
                } else {
                    "01"
                };
                format!("\n    <{} value=\"{}\"/>", field, value)
            })
            .collect();

        let links = match &self.image_url {
            Some(url) => format!(
                "\n  <resourceLinks>\n    <deviceImage url=\"{}\"/>\n  </resourceLinks>",
                url
            ),
            None => String::new(),
        };

        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<ZWaveDevice>
  <deviceDescription>
    <description>{}
    </description>
    <brandName>{}</brandName>
    <productName>{}</productName>
  </deviceDescription>
  <deviceData>{}
  </deviceData>{}
</ZWaveDevice>
"#,
            descriptions, self.brand_name, self.product_name, data, links
        )
    }
}

/// A temporary device description directory
pub struct ZddxDir {
    pub dir: TempDir,
}

impl ZddxDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn write_bytes(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn write_schema(&self) -> PathBuf {
        self.write("z-wave_v2.xsd", DEVICE_SCHEMA)
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path().join(name)).unwrap()
    }

    pub fn tabular_rows(&self) -> Vec<Vec<String>> {
        self.read("ZDDX.indx")
            .split_terminator("\r\n")
            .map(|line| line.split('\t').map(str::to_string).collect())
            .collect()
    }
}

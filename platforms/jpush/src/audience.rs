//! 推送目标
//!
//! 广播推送在协议中是字符串 `"all"`，定向推送是以目标类型为键的对象，
//! 多个键之间是 AND 关系。

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{JPushError, Result};

const ALL: &str = "all";

/// 推送目标类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudienceOp {
    /// 多个标签之间是 OR 关系，即取并集
    Tag,
    /// 多个标签之间是 AND 关系，即取交集
    TagAnd,
    /// 多个别名之间是 OR 关系
    Alias,
    /// 多个注册 ID 之间是 OR 关系
    RegistrationId,
}

impl AudienceOp {
    const ALL_OPS: [AudienceOp; 4] = [
        AudienceOp::Tag,
        AudienceOp::TagAnd,
        AudienceOp::Alias,
        AudienceOp::RegistrationId,
    ];

    /// 协议中的键名
    pub fn as_str(&self) -> &'static str {
        match self {
            AudienceOp::Tag => "tag",
            AudienceOp::TagAnd => "tag_and",
            AudienceOp::Alias => "alias",
            AudienceOp::RegistrationId => "registration_id",
        }
    }

    pub fn from_name(name: &str) -> Option<AudienceOp> {
        Self::ALL_OPS.into_iter().find(|op| op.as_str() == name)
    }
}

impl fmt::Display for AudienceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AudienceOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AudienceOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        AudienceOp::from_name(&name).ok_or_else(|| {
            <D::Error as de::Error>::custom(format!("unknown audience operator '{name}'"))
        })
    }
}

/// 单条推送目标规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudienceRule {
    op: AudienceOp,
    values: Vec<String>,
}

impl AudienceRule {
    pub fn new<I, S>(op: AudienceOp, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            op,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn tag<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(AudienceOp::Tag, tags)
    }

    pub fn tag_and<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(AudienceOp::TagAnd, tags)
    }

    pub fn alias<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(AudienceOp::Alias, aliases)
    }

    pub fn registration_id<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(AudienceOp::RegistrationId, ids)
    }

    pub fn op(&self) -> AudienceOp {
        self.op
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// 有序规则集，同一类型的规则最多出现一次
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet(Vec<AudienceRule>);

impl RuleSet {
    pub fn as_slice(&self) -> &[AudienceRule] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, rule: AudienceRule) -> Result<()> {
        if self.0.iter().any(|r| r.op == rule.op) {
            return Err(JPushError::InvalidAudience(format!(
                "duplicate '{}' rule",
                rule.op
            )));
        }
        self.0.push(rule);
        Ok(())
    }
}

/// 推送目标
///
/// `Everyone` 与空规则集在协议上等价，都编码为 `"all"`。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Audience {
    #[default]
    Everyone,
    Rules(RuleSet),
}

impl Audience {
    /// 全部用户
    pub fn all() -> Self {
        Audience::Everyone
    }

    /// 空规则集，通过 `with_rule` 添加规则
    pub fn new() -> Self {
        Audience::Rules(RuleSet::default())
    }

    /// 只有一条规则的目标
    pub fn from_rule(rule: AudienceRule) -> Self {
        Audience::Rules(RuleSet(vec![rule]))
    }

    /// 添加一条规则
    ///
    /// 同一类型只能出现一次，广播目标不能再添加规则。
    pub fn with_rule(mut self, rule: AudienceRule) -> Result<Self> {
        self.push_rule(rule)?;
        Ok(self)
    }

    pub fn push_rule(&mut self, rule: AudienceRule) -> Result<&mut Self> {
        match self {
            Audience::Everyone => Err(JPushError::InvalidAudience(format!(
                "cannot add '{}' rule to a broadcast audience",
                rule.op
            ))),
            Audience::Rules(rules) => {
                rules.insert(rule)?;
                Ok(self)
            }
        }
    }

    /// 是否编码为广播
    pub fn is_everyone(&self) -> bool {
        match self {
            Audience::Everyone => true,
            Audience::Rules(rules) => rules.is_empty(),
        }
    }

    pub fn rules(&self) -> &[AudienceRule] {
        match self {
            Audience::Everyone => &[],
            Audience::Rules(rules) => rules.as_slice(),
        }
    }
}

impl Serialize for Audience {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.is_everyone() {
            return serializer.serialize_str(ALL);
        }
        let rules = self.rules();
        let mut map = serializer.serialize_map(Some(rules.len()))?;
        for rule in rules {
            map.serialize_entry(rule.op.as_str(), &rule.values)?;
        }
        map.end()
    }
}

struct AudienceVisitor;

impl<'de> Visitor<'de> for AudienceVisitor {
    type Value = Audience;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the string \"all\" or an object of audience rules")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Audience, E> {
        if v == ALL {
            Ok(Audience::Everyone)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Audience, A::Error> {
        let mut audience = Audience::new();
        while let Some((op, values)) = access.next_entry::<AudienceOp, Vec<String>>()? {
            audience
                .push_rule(AudienceRule::new(op, values))
                .map_err(|e| <A::Error as de::Error>::custom(e))?;
        }
        Ok(audience)
    }
}

impl<'de> Deserialize<'de> for Audience {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(AudienceVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_everyone_encodes_as_all() {
        let json = serde_json::to_string(&Audience::all()).unwrap();
        assert_eq!(json, r#""all""#);
    }

    #[test]
    fn test_empty_rules_encode_as_all() {
        let json = serde_json::to_string(&Audience::new()).unwrap();
        assert_eq!(json, r#""all""#);
        assert!(Audience::new().is_everyone());
    }

    #[test]
    fn test_single_tag_rule() {
        let audience = Audience::new().with_rule(AudienceRule::tag(["a", "b"])).unwrap();
        let json = serde_json::to_string(&audience).unwrap();
        assert_eq!(json, r#"{"tag":["a","b"]}"#);
    }

    #[test]
    fn test_rules_keep_insertion_order() {
        let audience = Audience::new()
            .with_rule(AudienceRule::tag(["a"]))
            .unwrap()
            .with_rule(AudienceRule::alias(["x", "y"]))
            .unwrap();
        let json = serde_json::to_string(&audience).unwrap();
        assert_eq!(json, r#"{"tag":["a"],"alias":["x","y"]}"#);

        let audience = Audience::new()
            .with_rule(AudienceRule::registration_id(["r1"]))
            .unwrap()
            .with_rule(AudienceRule::tag_and(["B", "a", "B"]))
            .unwrap();
        let json = serde_json::to_string(&audience).unwrap();
        assert_eq!(json, r#"{"registration_id":["r1"],"tag_and":["B","a","B"]}"#);
    }

    #[test]
    fn test_empty_values_encode_as_empty_array() {
        let audience = Audience::new()
            .with_rule(AudienceRule::alias(Vec::<String>::new()))
            .unwrap();
        assert_eq!(serde_json::to_string(&audience).unwrap(), r#"{"alias":[]}"#);
    }

    #[test]
    fn test_duplicate_operator_rejected() {
        let result = Audience::new()
            .with_rule(AudienceRule::tag(["a"]))
            .unwrap()
            .with_rule(AudienceRule::tag(["b"]));
        match result {
            Err(JPushError::InvalidAudience(msg)) => assert!(msg.contains("tag")),
            other => panic!("Expected invalid audience, got {:?}", other),
        }
    }

    #[test]
    fn test_single_rule_audience_keeps_one_key_per_operator() {
        let mut audience = Audience::from_rule(AudienceRule::tag(["a"]));
        let err = audience.push_rule(AudienceRule::tag(["b"])).unwrap_err();
        assert!(err.to_string().contains("duplicate 'tag' rule"));
        assert_eq!(serde_json::to_string(&audience).unwrap(), r#"{"tag":["a"]}"#);

        match &audience {
            Audience::Rules(rules) => assert_eq!(rules.len(), 1),
            other => panic!("Expected rule set, got {:?}", other),
        }
    }

    #[test]
    fn test_operator_names() {
        for (op, name) in [
            (AudienceOp::Tag, "tag"),
            (AudienceOp::TagAnd, "tag_and"),
            (AudienceOp::Alias, "alias"),
            (AudienceOp::RegistrationId, "registration_id"),
        ] {
            assert_eq!(op.to_string(), name);
            assert_eq!(AudienceOp::from_name(name), Some(op));
            assert_eq!(serde_json::to_string(&op).unwrap(), format!("\"{name}\""));
        }
        assert_eq!(AudienceOp::from_name("Tag"), None);
    }

    #[test]
    fn test_rule_on_broadcast_rejected() {
        let result = Audience::all().with_rule(AudienceRule::alias(["x"]));
        assert!(matches!(result, Err(JPushError::InvalidAudience(_))));
    }

    #[test]
    fn test_deserialize_wire_shapes() {
        let audience: Audience = serde_json::from_str(r#""all""#).unwrap();
        assert_eq!(audience, Audience::Everyone);

        let audience: Audience =
            serde_json::from_str(r#"{"alias":["x"],"tag":["a","b"]}"#).unwrap();
        assert_eq!(audience.rules().len(), 2);
        assert_eq!(audience.rules()[0].op(), AudienceOp::Alias);
        assert_eq!(audience.rules()[1].values(), ["a", "b"]);

        assert!(serde_json::from_str::<Audience>(r#""some""#).is_err());
        assert!(serde_json::from_str::<Audience>(r#"{"segment":["s"]}"#).is_err());

        let err = serde_json::from_str::<Audience>(r#"{"tag":["a"],"tag":["b"]}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate 'tag' rule"));
    }
}

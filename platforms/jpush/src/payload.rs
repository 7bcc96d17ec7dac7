use std::fmt;
use std::ops::BitOr;

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::audience::{Audience, AudienceRule};

/// 附加字段
pub type Extras = Map<String, Value>;

/// 推送平台（位掩码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform(u8);

impl Platform {
    pub const IOS: Platform = Platform(1);
    pub const ANDROID: Platform = Platform(1 << 1);
    pub const WIN_PHONE: Platform = Platform(1 << 2);
    pub const ALL: Platform = Platform(1 | 1 << 1 | 1 << 2);

    const NAMES: [(Platform, &'static str); 3] = [
        (Platform::IOS, "ios"),
        (Platform::ANDROID, "android"),
        (Platform::WIN_PHONE, "winphone"),
    ];

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: Platform) -> bool {
        self.0 & other.0 == other.0
    }

    fn from_name(name: &str) -> Option<Platform> {
        Self::NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(p, _)| *p)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::ALL
    }
}

impl BitOr for Platform {
    type Output = Platform;

    fn bitor(self, rhs: Platform) -> Platform {
        Platform(self.0 | rhs.0)
    }
}

impl Serialize for Platform {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.contains(Platform::ALL) {
            return serializer.serialize_str("all");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(p, _)| self.contains(*p))
            .map(|(_, n)| *n)
            .collect();
        let mut seq = serializer.serialize_seq(Some(names.len()))?;
        for name in names {
            seq.serialize_element(name)?;
        }
        seq.end()
    }
}

struct PlatformVisitor;

impl<'de> Visitor<'de> for PlatformVisitor {
    type Value = Platform;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"all\" or a list of platform names")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Platform, E> {
        match v {
            "all" => Ok(Platform::ALL),
            other => Platform::from_name(other)
                .ok_or_else(|| E::invalid_value(de::Unexpected::Str(other), &self)),
        }
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Platform, A::Error> {
        let mut platform = Platform(0);
        while let Some(name) = seq.next_element::<String>()? {
            let p = Platform::from_name(&name).ok_or_else(|| {
                <A::Error as de::Error>::unknown_variant(&name, &["ios", "android", "winphone"])
            })?;
            platform = platform | p;
        }
        Ok(platform)
    }
}

impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PlatformVisitor)
    }
}

/// Android 通知提醒方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertType(pub i32);

impl AlertType {
    pub const DEFAULT_ALL: AlertType = AlertType(-1);
    pub const DEFAULT_SOUND: AlertType = AlertType(1);
    pub const DEFAULT_VIBRATE: AlertType = AlertType(2);
    pub const DEFAULT_LIGHTS: AlertType = AlertType(4);
}

/// 通知
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// 各平台通用的通知内容
    pub alert: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android: Option<AndroidNotification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios: Option<IosNotification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winphone: Option<WinPhoneNotification>,
}

impl Notification {
    pub fn alert(content: impl Into<String>) -> Self {
        Self {
            alert: content.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AndroidNotification {
    /// 字符串或对象，覆盖通用 alert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// 1: bigText, 2: Inbox, 3: bigPicture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_type: Option<AlertType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub big_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbox: Option<Extras>,
    #[serde(
        rename = "big_pic_path",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub pic_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IosNotification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<i32>,
    #[serde(rename = "content-available", default, skip_serializing_if = "std::ops::Not::not")]
    pub content_available: bool,
    #[serde(rename = "mutable-content", default, skip_serializing_if = "std::ops::Not::not")]
    pub mutable_content: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WinPhoneNotification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "_open_page", default, skip_serializing_if = "Option::is_none")]
    pub open_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
}

/// 自定义消息，不在通知栏展示，由应用自行处理
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub msg_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
}

/// 推送可选项
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// 调用标识，API 返回时原样返回
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sendno: Option<i64>,
    /// 离线消息保留时长（秒），0 表示不保留
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_to_live: Option<u32>,
    /// 要覆盖的前一条推送的 msg_id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_msg_id: Option<i64>,
    /// true 推送生产环境，false 推送开发环境
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apns_production: Option<bool>,
    /// 定速推送时长（分钟）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub big_push_duration: Option<u32>,
}

/// 推送请求
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushRequest {
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub audience: Audience,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(default)]
    pub options: Options,
}

impl PushRequest {
    pub fn new(audience: Audience) -> Self {
        Self {
            audience,
            ..Default::default()
        }
    }

    /// 全平台、全部用户的通知
    pub fn broadcast(content: impl Into<String>) -> Self {
        Self::new(Audience::all()).notification(Notification::alert(content))
    }

    /// 推送通知给指定注册 ID
    pub fn to_registration_ids<I, S>(content: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Audience::from_rule(AudienceRule::registration_id(ids)))
            .notification(Notification::alert(content))
    }

    /// 推送通知给拥有任一标签的用户
    pub fn to_any_tag<I, S>(content: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Audience::from_rule(AudienceRule::tag(tags)))
            .notification(Notification::alert(content))
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn notification(mut self, notification: Notification) -> Self {
        self.notification = Some(notification);
        self
    }

    pub fn message(mut self, message: Message) -> Self {
        self.message = Some(message);
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }
}

/// 推送结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReply {
    pub sendno: String,
    pub msg_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_platform_wire_format() {
        assert_eq!(serde_json::to_value(Platform::ALL).unwrap(), json!("all"));
        assert_eq!(
            serde_json::to_value(Platform::ANDROID | Platform::IOS).unwrap(),
            json!(["ios", "android"])
        );
        assert_eq!(
            serde_json::to_value(Platform::WIN_PHONE).unwrap(),
            json!(["winphone"])
        );

        let platform: Platform = serde_json::from_value(json!(["android", "winphone"])).unwrap();
        assert!(platform.contains(Platform::ANDROID));
        assert!(!platform.contains(Platform::IOS));
        let platform: Platform = serde_json::from_value(json!("all")).unwrap();
        assert_eq!(platform, Platform::ALL);
        assert!(serde_json::from_value::<Platform>(json!(["blackberry"])).is_err());
    }

    #[test]
    fn test_push_to_user_request() {
        let req = PushRequest::to_registration_ids("hello", ["id1", "id2"]);
        assert_eq!(
            serde_json::to_string(&req.audience).unwrap(),
            r#"{"registration_id":["id1","id2"]}"#
        );
        assert_eq!(req.notification.as_ref().unwrap().alert, "hello");
        assert!(req.message.is_none());
        assert_eq!(req.platform, Platform::ALL);
    }

    #[test]
    fn test_request_omits_empty_fields() {
        let req = PushRequest::broadcast("hi");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "platform": "all",
                "audience": "all",
                "notification": {"alert": "hi"},
                "options": {}
            })
        );
    }

    #[test]
    fn test_full_request_shape() {
        let mut extras = Extras::new();
        extras.insert("k".to_string(), json!("v"));
        let req = PushRequest::to_any_tag("", ["vip"])
            .platform(Platform::ANDROID)
            .notification(Notification {
                alert: "hi".to_string(),
                android: Some(AndroidNotification {
                    title: Some("t".to_string()),
                    alert_type: Some(AlertType::DEFAULT_ALL),
                    extras: Some(extras),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .message(Message {
                msg_content: "body".to_string(),
                ..Default::default()
            })
            .options(Options {
                time_to_live: Some(60),
                apns_production: Some(false),
                ..Default::default()
            });

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["platform"], json!(["android"]));
        assert_eq!(value["audience"], json!({"tag": ["vip"]}));
        assert_eq!(
            value["notification"]["android"],
            json!({"title": "t", "alert_type": -1, "extras": {"k": "v"}})
        );
        assert_eq!(value["message"], json!({"msg_content": "body"}));
        assert_eq!(
            value["options"],
            json!({"time_to_live": 60, "apns_production": false})
        );
    }

    #[test]
    fn test_push_reply_decode() {
        let reply: PushReply = serde_json::from_str(r#"{"sendno":"1","msg_id":"m1"}"#).unwrap();
        assert_eq!(reply.sendno, "1");
        assert_eq!(reply.msg_id, "m1");
    }
}

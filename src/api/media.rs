//! Methods whose parameters can carry a file body. All of them go through
//! [`Api::upload`], so an [`InputFile::Memory`] switches the request to
//! multipart while file ids and URLs stay on the JSON path.

use serde::Serialize;

use super::{Api, InputFiles, SendOptions};
use crate::error::Result;
use crate::types::{ChatId, File, InputFile, Message, MessageEntity, UserProfilePhotos};

fn with_thumbnail<'a>(
    main: (&'static str, &'a InputFile),
    thumbnail: &'a Option<InputFile>,
) -> Vec<(&'static str, &'a InputFile)> {
    let mut files = vec![main];
    if let Some(thumbnail) = thumbnail {
        files.push(("thumbnail", thumbnail));
    }
    files
}

#[derive(Debug, Clone, Serialize)]
pub struct SendPhotoParams {
    pub chat_id: ChatId,
    pub photo: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption_entities: Option<Vec<MessageEntity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_spoiler: Option<bool>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl SendPhotoParams {
    pub fn new(chat_id: impl Into<ChatId>, photo: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            photo,
            caption: None,
            parse_mode: None,
            caption_entities: None,
            has_spoiler: None,
            options: SendOptions::default(),
        }
    }
}

impl InputFiles for SendPhotoParams {
    fn input_files(&self) -> Vec<(&'static str, &InputFile)> {
        vec![("photo", &self.photo)]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendAudioParams {
    pub chat_id: ChatId,
    pub audio: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<InputFile>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl SendAudioParams {
    pub fn new(chat_id: impl Into<ChatId>, audio: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            audio,
            caption: None,
            parse_mode: None,
            duration: None,
            performer: None,
            title: None,
            thumbnail: None,
            options: SendOptions::default(),
        }
    }
}

impl InputFiles for SendAudioParams {
    fn input_files(&self) -> Vec<(&'static str, &InputFile)> {
        with_thumbnail(("audio", &self.audio), &self.thumbnail)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendDocumentParams {
    pub chat_id: ChatId,
    pub document: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<InputFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_content_type_detection: Option<bool>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl SendDocumentParams {
    pub fn new(chat_id: impl Into<ChatId>, document: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            document,
            thumbnail: None,
            caption: None,
            parse_mode: None,
            disable_content_type_detection: None,
            options: SendOptions::default(),
        }
    }
}

impl InputFiles for SendDocumentParams {
    fn input_files(&self) -> Vec<(&'static str, &InputFile)> {
        with_thumbnail(("document", &self.document), &self.thumbnail)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendVideoParams {
    pub chat_id: ChatId,
    pub video: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<InputFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_spoiler: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports_streaming: Option<bool>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl SendVideoParams {
    pub fn new(chat_id: impl Into<ChatId>, video: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            video,
            duration: None,
            width: None,
            height: None,
            thumbnail: None,
            caption: None,
            parse_mode: None,
            has_spoiler: None,
            supports_streaming: None,
            options: SendOptions::default(),
        }
    }
}

impl InputFiles for SendVideoParams {
    fn input_files(&self) -> Vec<(&'static str, &InputFile)> {
        with_thumbnail(("video", &self.video), &self.thumbnail)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendAnimationParams {
    pub chat_id: ChatId,
    pub animation: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<InputFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_spoiler: Option<bool>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl SendAnimationParams {
    pub fn new(chat_id: impl Into<ChatId>, animation: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            animation,
            duration: None,
            width: None,
            height: None,
            thumbnail: None,
            caption: None,
            parse_mode: None,
            has_spoiler: None,
            options: SendOptions::default(),
        }
    }
}

impl InputFiles for SendAnimationParams {
    fn input_files(&self) -> Vec<(&'static str, &InputFile)> {
        with_thumbnail(("animation", &self.animation), &self.thumbnail)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendVoiceParams {
    pub chat_id: ChatId,
    /// OGG/OPUS, MP3 or M4A.
    pub voice: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl SendVoiceParams {
    pub fn new(chat_id: impl Into<ChatId>, voice: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            voice,
            caption: None,
            parse_mode: None,
            duration: None,
            options: SendOptions::default(),
        }
    }
}

impl InputFiles for SendVoiceParams {
    fn input_files(&self) -> Vec<(&'static str, &InputFile)> {
        vec![("voice", &self.voice)]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendVideoNoteParams {
    pub chat_id: ChatId,
    pub video_note: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<InputFile>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl SendVideoNoteParams {
    pub fn new(chat_id: impl Into<ChatId>, video_note: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            video_note,
            duration: None,
            length: None,
            thumbnail: None,
            options: SendOptions::default(),
        }
    }
}

impl InputFiles for SendVideoNoteParams {
    fn input_files(&self) -> Vec<(&'static str, &InputFile)> {
        with_thumbnail(("video_note", &self.video_note), &self.thumbnail)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendStickerParams {
    pub chat_id: ChatId,
    pub sticker: InputFile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl SendStickerParams {
    pub fn new(chat_id: impl Into<ChatId>, sticker: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            sticker,
            emoji: None,
            options: SendOptions::default(),
        }
    }
}

impl InputFiles for SendStickerParams {
    fn input_files(&self) -> Vec<(&'static str, &InputFile)> {
        vec![("sticker", &self.sticker)]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SetChatPhotoParams {
    pub chat_id: ChatId,
    /// Must be an upload; file ids are rejected by the Bot API.
    pub photo: InputFile,
}

impl SetChatPhotoParams {
    pub fn new(chat_id: impl Into<ChatId>, photo: InputFile) -> Self {
        Self {
            chat_id: chat_id.into(),
            photo,
        }
    }
}

impl InputFiles for SetChatPhotoParams {
    fn input_files(&self) -> Vec<(&'static str, &InputFile)> {
        vec![("photo", &self.photo)]
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetUserProfilePhotosParams {
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl GetUserProfilePhotosParams {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            offset: None,
            limit: None,
        }
    }
}

#[derive(Serialize)]
struct FileQuery<'a> {
    file_id: &'a str,
}

impl Api {
    pub async fn send_photo(&self, params: &SendPhotoParams) -> Result<Message> {
        self.upload("sendPhoto", params).await
    }

    pub async fn send_audio(&self, params: &SendAudioParams) -> Result<Message> {
        self.upload("sendAudio", params).await
    }

    pub async fn send_document(&self, params: &SendDocumentParams) -> Result<Message> {
        self.upload("sendDocument", params).await
    }

    pub async fn send_video(&self, params: &SendVideoParams) -> Result<Message> {
        self.upload("sendVideo", params).await
    }

    pub async fn send_animation(&self, params: &SendAnimationParams) -> Result<Message> {
        self.upload("sendAnimation", params).await
    }

    pub async fn send_voice(&self, params: &SendVoiceParams) -> Result<Message> {
        self.upload("sendVoice", params).await
    }

    pub async fn send_video_note(&self, params: &SendVideoNoteParams) -> Result<Message> {
        self.upload("sendVideoNote", params).await
    }

    pub async fn send_sticker(&self, params: &SendStickerParams) -> Result<Message> {
        self.upload("sendSticker", params).await
    }

    pub async fn set_chat_photo(&self, params: &SetChatPhotoParams) -> Result<bool> {
        self.upload("setChatPhoto", params).await
    }

    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        self.call("getFile", Some(&FileQuery { file_id })).await
    }

    pub async fn get_user_profile_photos(
        &self,
        params: &GetUserProfilePhotosParams,
    ) -> Result<UserProfilePhotos> {
        self.call("getUserProfilePhotos", Some(params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_thumbnail_listed_only_when_present() {
        let mut params = SendVideoParams::new(1, InputFile::url("https://example.com/v.mp4"));
        assert_eq!(params.input_files().len(), 1);

        params.thumbnail = Some(InputFile::memory("thumb.jpg", vec![0xff, 0xd8]));
        let names: Vec<_> = params.input_files().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["video", "thumbnail"]);
    }

    #[tokio::test]
    async fn test_memory_thumbnail_forces_multipart() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/sendAudio")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="audio""#.to_string()),
                Matcher::Regex("AwADfileid".to_string()),
                Matcher::Regex(r#"filename="cover.jpg""#.to_string()),
            ]))
            .with_body(
                json!({
                    "ok": true,
                    "result": {
                        "message_id": 3,
                        "chat": { "id": 1, "type": "private" },
                        "date": 1700000000,
                        "audio": { "file_id": "AwADfileid", "file_unique_id": "u", "duration": 30 }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let api = Api::new(reqwest::Client::new(), server.url(), "TEST_TOKEN");
        let mut params = SendAudioParams::new(1, InputFile::file_id("AwADfileid"));
        params.thumbnail = Some(InputFile::memory("cover.jpg", vec![1, 2, 3]));
        let message = api.send_audio(&params).await.unwrap();
        assert_eq!(message.audio.map(|a| a.duration), Some(30));
        mock.assert_async().await;
    }
}

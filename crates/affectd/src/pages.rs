//! Server-rendered HTML views: the upload form and the result page.

/// Upload form. Field names must match what the predict handler reads.
pub const INDEX: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Affect</title>
</head>
<body>
  <h1>How are you feeling?</h1>
  <form action="/predict" method="post" enctype="multipart/form-data">
    <p><label>Name: <input type="text" name="name" placeholder="Anonymous"></label></p>
    <p><label>Face photo: <input type="file" name="file" accept="image/*"></label></p>
    <p><button type="submit">Classify</button></p>
  </form>
</body>
</html>
"#;

/// Result view showing the predicted label and the uploaded image.
pub fn result_page(emotion: &str, image_filename: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Affect — result</title>
</head>
<body>
  <h1>Detected emotion: {emotion}</h1>
  <img src="/uploads/{image}" alt="uploaded face" width="240">
  <p><a href="/">Try another photo</a></p>
</body>
</html>
"#,
        emotion = escape(emotion),
        image = escape(image_filename),
    )
}

/// Minimal HTML escaping for interpolated values.
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

//! # Códigos de Estado HTTP
//!
//! Los únicos códigos que produce el servidor de archivos:
//!
//! - **2xx**: 200 OK (archivo servido)
//! - **4xx**: 400 (request line inválido), 404 (ruta rechazada o inexistente)
//! - **5xx**: 500 (arena sin memoria), 503 (cola llena)

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200 OK - El archivo se envía en el body
    Ok = 200,

    /// 400 Bad Request - El request line no se pudo parsear
    BadRequest = 400,

    /// 404 Not Found - Fuera del root, inexistente o no resoluble
    NotFound = 404,

    /// 500 Internal Server Error - Sin memoria en la arena de la conexión
    InternalServerError = 500,

    /// 503 Service Unavailable - Cola de conexiones llena
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use static_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Texto de razón (reason phrase) del status line
    ///
    /// # Ejemplo
    /// ```
    /// use static_server::http::StatusCode;
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "NOT FOUND");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "BAD REQUEST",
            StatusCode::NotFound => "NOT FOUND",
            StatusCode::InternalServerError => "INTERNAL SERVER ERROR",
            StatusCode::ServiceUnavailable => "SERVICE UNAVAILABLE",
        }
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
